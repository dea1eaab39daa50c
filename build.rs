//! Retrieves version information from Git and the build environment so the
//! engine can identify itself precisely in the `uci` handshake.

fn main() -> shadow_rs::SdResult<()> {
    shadow_rs::new()
}
