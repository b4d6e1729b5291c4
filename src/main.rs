use anyhow::Result;

fn main() -> Result<()> {
    postmock::cli::run()
}
