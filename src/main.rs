mod app;
mod audio;
mod config;
mod error;
mod library;
mod logging;
mod navigator;
mod player;
mod runtime;
mod scrobble;
mod seek;
mod session;
mod transport;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
