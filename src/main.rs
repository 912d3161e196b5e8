fn main() -> anyhow::Result<()> {
    notetake::cli::run()
}
