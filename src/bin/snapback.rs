use anyhow::Result;

fn main() -> Result<()> {
    snapback::cli::run()
}
