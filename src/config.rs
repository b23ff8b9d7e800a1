//! Diagnostic harness configuration.
//!
//! Loaded from a TOML file by the `fp11-harness` binary. Has no bearing on
//! the core itself — `Fpp::new` takes its initial register values directly
//! — this only controls how the harness seeds that state and where it looks
//! for a tape to replay.

use serde::Deserialize;

const DEFAULT_TAPE_PATH: &str = "tape.jsonl";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    #[serde(default)]
    pub fps: FpsConfig,
}

#[derive(Debug, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub trace: bool,

    #[serde(default = "default_tape_path")]
    pub tape_path: String,
}

fn default_tape_path() -> String {
    DEFAULT_TAPE_PATH.to_string()
}

/// Initial state of the FPS trap-enable bits, as the harness would set them
/// before replaying a tape. Field names mirror the FPS bit mnemonics.
#[derive(Debug, Deserialize, Clone)]
pub struct FpsConfig {
    #[serde(default)]
    pub fiuv: bool,
    #[serde(default)]
    pub fiu: bool,
    #[serde(default)]
    pub fiv: bool,
    #[serde(default)]
    pub fic: bool,
    #[serde(default)]
    pub fd_double: bool,
    #[serde(default)]
    pub fl_long: bool,
    #[serde(default)]
    pub ft_truncate: bool,
}

impl Default for FpsConfig {
    fn default() -> Self {
        Self {
            fiuv: false,
            fiu: false,
            fiv: false,
            fic: false,
            fd_double: true,
            fl_long: false,
            ft_truncate: false,
        }
    }
}

impl FpsConfig {
    /// Builds the initial `Fps` raw value these settings describe, applied
    /// by the harness before a tape record supplies its own override (§3's
    /// FIUV/FIU/FIV/FIC/FD/FL/FT bits).
    pub fn initial_fps(&self) -> crate::fpp::Fps {
        let mut fps = crate::fpp::Fps::default();
        fps.set_fiuv(self.fiuv);
        fps.set_fiu(self.fiu);
        fps.set_fiv(self.fiv);
        fps.set_fic(self.fic);
        fps.set_double_mode(self.fd_double);
        fps.set_long_mode(self.fl_long);
        fps.set_truncate(self.ft_truncate);
        fps
    }
}
