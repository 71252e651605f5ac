use super::*;

#[test]
fn defaults_resolve_without_any_source() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert!(settings.database.url.is_none());
    assert_eq!(settings.database.max_connections.get(), 8);
    assert_eq!(settings.cache.backend, CacheBackend::Redis);
    assert_eq!(settings.cache.redis_url, DEFAULT_REDIS_URL);
    assert_eq!(settings.cache.memory_capacity.get(), 10_000);
    assert_eq!(
        settings.cache.collection_policy,
        CollectionPolicy::ExpireOnly
    );
    assert_eq!(settings.cache.ttls, CacheTtls::default());
    assert_eq!(
        settings.jokes.upstream_url.as_str(),
        DEFAULT_JOKES_UPSTREAM_URL
    );
    assert_eq!(settings.jokes.timeout, Duration::from_secs(10));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());
    raw.cache.backend = Some("redis".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        cache: CacheOverrides {
            cache_backend: Some("memory".to_string()),
            redis_url: None,
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.cache.backend, CacheBackend::Memory);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn ttl_overrides_apply_per_operation() {
    let mut raw = RawSettings::default();
    raw.cache.user_update_ttl_seconds = Some(120);
    raw.cache.joke_ttl_seconds = Some(30);

    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.cache.ttls.user_update, Duration::from_secs(120));
    assert_eq!(settings.cache.ttls.joke, Duration::from_secs(30));
    assert_eq!(settings.cache.ttls.user_read, Duration::from_secs(10));
}

#[test]
fn zero_ttl_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.users_all_ttl_seconds = Some(0);

    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.users_all_ttl_seconds",
            ..
        }
    ));
}

#[test]
fn ttl_beyond_one_year_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.joke_ttl_seconds = Some(u64::MAX);

    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.joke_ttl_seconds",
            ..
        }
    ));

    let mut raw = RawSettings::default();
    raw.cache.user_update_ttl_seconds = Some(MAX_TTL_SECS);
    let settings = Settings::from_raw(raw).expect("one year is accepted");
    assert_eq!(
        settings.cache.ttls.user_update,
        Duration::from_secs(MAX_TTL_SECS)
    );
}

#[test]
fn zero_upstream_timeout_is_rejected() {
    let mut raw = RawSettings::default();
    raw.jokes.timeout_seconds = Some(0);

    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "jokes.timeout_seconds",
            ..
        }
    ));
}

#[test]
fn unknown_backend_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.backend = Some("memcached".to_string());

    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.backend",
            ..
        }
    ));
}

#[test]
fn redis_url_scheme_is_checked_only_for_redis_backend() {
    let mut raw = RawSettings::default();
    raw.cache.redis_url = Some("http://localhost:6379".to_string());
    assert!(Settings::from_raw(raw.clone()).is_err());

    raw.cache.backend = Some("memory".to_string());
    assert!(Settings::from_raw(raw).is_ok());
}

#[test]
fn blank_database_url_is_treated_as_unset() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn invalid_collection_policy_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.collection_policy = Some("sometimes".to_string());

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["jester"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_arguments() {
    let args = CliArgs::parse_from([
        "jester",
        "serve",
        "--server-port",
        "8080",
        "--cache-backend",
        "memory",
        "--log-json",
        "yes",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(args) => {
            assert_eq!(args.overrides.server_port, Some(8080));
            assert_eq!(args.overrides.cache.cache_backend.as_deref(), Some("memory"));
            assert_eq!(args.overrides.log_json, Some(true));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_cache_subcommands() {
    let args = CliArgs::parse_from(["jester", "cache", "ttl", "users:all"]);
    match args.command.expect("cache command") {
        Command::Cache(CacheArgs {
            command: CacheCommand::Ttl { key },
            ..
        }) => assert_eq!(key, "users:all"),
        other => panic!("unexpected command: {other:?}"),
    }

    let args = CliArgs::parse_from([
        "jester",
        "cache",
        "--redis-url",
        "redis://cache:6379",
        "keys",
    ]);
    match args.command.expect("cache command") {
        Command::Cache(CacheArgs {
            overrides,
            command: CacheCommand::Keys { pattern },
        }) => {
            assert_eq!(pattern, "*");
            assert_eq!(overrides.redis_url.as_deref(), Some("redis://cache:6379"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn cache_overrides_reach_settings() {
    let mut raw = RawSettings::default();
    raw.apply_cache_overrides(&CacheOverrides {
        cache_backend: None,
        redis_url: Some("redis://cache:6380".to_string()),
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.cache.redis_url, "redis://cache:6380");
}
