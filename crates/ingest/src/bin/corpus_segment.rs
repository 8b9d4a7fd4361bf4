use anyhow::Result;

fn main() -> Result<()> {
    corpus_ingest::main_entry()
}
