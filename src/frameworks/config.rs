use std::{env, net::IpAddr, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("TETRIS_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5000)
}

pub fn bind_host() -> IpAddr {
    env::var("TETRIS_SERVER_HOST")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

// Server gravity period; 0 disables server-driven descent.
pub fn gravity_tick() -> Option<Duration> {
    let millis = env::var("GRAVITY_TICK_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(50);
    (millis > 0).then(|| Duration::from_millis(millis))
}

pub const OUTBOUND_CHANNEL_CAPACITY: usize = 256;

pub const SLOW_EFFECT_DURATION: Duration = Duration::from_secs(5);
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 50;
