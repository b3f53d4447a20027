fn main() -> anyhow::Result<()> {
    wemprobe::cli::run_cli()
}
