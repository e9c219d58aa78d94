/// Initialise the global logger.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` (the number of `-v` flags)
/// raises the level from `info` to `debug` and then `trace`.
pub fn init(verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    builder
        .target(env_logger::Target::Stderr)
        .filter_level(level_for(verbosity))
        .format_timestamp(None);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    // A second init (tests, embedding) keeps the first logger.
    let _ = builder.try_init();
}

fn level_for(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0), log::LevelFilter::Info);
        assert_eq!(level_for(1), log::LevelFilter::Debug);
        assert_eq!(level_for(5), log::LevelFilter::Trace);
    }

    #[test]
    fn init_twice_is_harmless() {
        init(0);
        init(2);
    }
}
