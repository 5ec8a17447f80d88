fn main() {
    #[cfg(feature = "cli")]
    unmarker::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("unmarker: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
