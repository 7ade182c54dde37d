use pulse_sphere::{PulseApp, SessionConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = PulseApp::new(SessionConfig::default())?;
    app.run()
}
