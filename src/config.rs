#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum CargoEnv {
    Development,
    Production,
}

#[derive(clap::Parser)]
pub struct AppConfig {
    // production or development
    #[clap(long, env, value_enum)]
    pub cargo_env: CargoEnv,

    // port that the proxy will bind to
    #[clap(long, env, default_value = "4000")]
    pub port: u16,

    // this should be either * for allowing everything, or a comma seperated list of domains like
    // example.com,something.com
    #[clap(long, env, default_value = "*")]
    pub cors_origin: String,

    // per-request deadline on upstream fetches; live segments can be slow but should never hang
    // the relay forever
    #[clap(long, env, default_value = "15")]
    pub upstream_timeout_secs: u64,

    // base url of the physical camera, ex: http://192.168.0.50
    // when unset, /api/cam/* requires an explicit ?base= override
    #[clap(long, env)]
    pub cam_base: Option<String>,

    // appended to the base by plain concatenation, the esp32 serves mjpeg on its own port
    #[clap(long, env, default_value = ":81/stream")]
    pub cam_stream_path: String,

    // still-frame endpoint on the camera
    #[clap(long, env, default_value = "/capture")]
    pub cam_snapshot_path: String,

    // optional sentry integration
    #[clap(long, env)]
    pub sentry_dsn: Option<String>,
}

impl Default for AppConfig {
    // defaults aren't really needed here but it's here as a bad fallback
    fn default() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            port: 4000,
            cors_origin: "*".to_string(),
            upstream_timeout_secs: 15,
            cam_base: None,
            cam_stream_path: ":81/stream".to_string(),
            cam_snapshot_path: "/capture".to_string(),
            sentry_dsn: None,
        }
    }
}
