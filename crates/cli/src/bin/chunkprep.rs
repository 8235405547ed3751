use anyhow::Result;

fn main() -> Result<()> {
    chunkprep_cli::main_entry()
}
