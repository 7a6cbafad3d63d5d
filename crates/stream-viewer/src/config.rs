use clap::Parser;
use std::path::PathBuf;

/// `stream_viewer` - live 3D point cloud viewer.
///
/// Connects to a WebSocket server, asks it for data once, and redraws every
/// JSON point array it sends back.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// WebSocket endpoint delivering point arrays.
    #[arg(long, env = "POINT_STREAM_URL", default_value = "ws://localhost:3030/ws")]
    pub url: String,

    /// Text frame sent once the socket opens.
    #[arg(long, env = "POINT_STREAM_REQUEST", default_value = "request_data")]
    pub request: String,

    /// Side length of each rendered point, in world units.
    #[arg(long, env = "POINT_SIZE", default_value_t = 0.1)]
    pub point_size: f32,

    /// Point colour as a hex RGB triplet, e.g. `ffffff` or `#ff8800`.
    #[arg(long, env = "POINT_COLOR", default_value = "ffffff", value_parser = parse_hex_rgb)]
    pub color: [f32; 3],

    /// Points file shown until the first streamed payload arrives.
    #[arg(long, env = "POINT_PRELOAD")]
    pub preload: Option<PathBuf>,

    /// Reload the `--preload` file whenever it changes on disk.
    #[arg(long, env = "POINT_WATCH", requires = "preload")]
    pub watch: bool,
}

/// Parses `rrggbb` (optionally `#`-prefixed) into linear RGB in [0, 1].
pub fn parse_hex_rgb(s: &str) -> Result<[f32; 3], String> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(format!("expected 6 hex digits, got {:?}", s));
    }

    let value = u32::from_str_radix(hex, 16).map_err(|e| format!("{:?}: {}", s, e))?;
    let channel = |shift: u32| srgb_to_linear(((value >> shift) & 0xff) as f32 / 255.0);

    Ok([channel(16), channel(8), channel(0)])
}

/// The surface is sRGB, so colours given in sRGB are linearised here.
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
