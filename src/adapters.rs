use crate::foundation::error::{PlayforgeError, PlayforgeResult};

/// Ad-network target of an export. Each adapter customizes the generic
/// bundle for exactly one network; adapters do not stack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Web,
    Mintegral,
}

impl Network {
    pub fn name(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Mintegral => "mintegral",
        }
    }

    /// Whether the network requires the runtime script as a local archive
    /// member instead of inlined into `index.html`.
    pub fn requires_local_runtime(self) -> bool {
        matches!(self, Self::Mintegral)
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Network {
    type Err = PlayforgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "web" => Ok(Self::Web),
            "mintegral" => Ok(Self::Mintegral),
            other => Err(PlayforgeError::adapter(format!("unknown network '{other}'"))),
        }
    }
}

/// Markers delimiting the only region of `index.html` an adapter may
/// rewrite. Everything else in the bundle is the versioned runtime and is
/// off limits to adapters.
pub const HOOKS_BEGIN: &str = "<!-- playforge:hooks:begin -->";
pub const HOOKS_END: &str = "<!-- playforge:hooks:end -->";

const MINTEGRAL_HOOKS: &str = r#"<script>
window.playforgeHooks = {
  gameReady: function () { if (typeof window.gameReady === 'function') { window.gameReady(); } },
  gameStart: function () {},
  gameEnd: function () { if (typeof window.gameEnd === 'function') { window.gameEnd(); } },
  gameClose: function () { if (typeof window.gameClose === 'function') { window.gameClose(); } },
  install: function () { if (typeof window.install === 'function') { window.install(); } },
  installOverridesNavigation: true
};
// Entry point the Mintegral container invokes on the creative.
window.gameStart = function () { window.playforge.start(); };
// The SDK provides these; keep callable stubs for containers that do not.
window.gameReady = window.gameReady || function () {};
window.gameEnd = window.gameEnd || function () {};
window.gameClose = window.gameClose || function () {};
window.install = window.install || function () {};
</script>"#;

/// Post-process the generic entry point for one network. `Web` is the
/// identity transform; specialized networks rewrite only the hook region.
pub fn adapt(html: &str, network: Network) -> PlayforgeResult<String> {
    match network {
        Network::Web => Ok(html.to_string()),
        Network::Mintegral => inject_hooks(html, MINTEGRAL_HOOKS),
    }
}

fn inject_hooks(html: &str, block: &str) -> PlayforgeResult<String> {
    let begin = html
        .find(HOOKS_BEGIN)
        .ok_or_else(|| PlayforgeError::adapter("hook begin marker missing from entry point"))?;
    let end = html
        .find(HOOKS_END)
        .ok_or_else(|| PlayforgeError::adapter("hook end marker missing from entry point"))?;
    if end < begin {
        return Err(PlayforgeError::adapter("hook markers are out of order"));
    }

    let mut out = String::with_capacity(html.len() + block.len());
    out.push_str(&html[..begin + HOOKS_BEGIN.len()]);
    out.push('\n');
    out.push_str(block);
    out.push('\n');
    out.push_str(&html[end..]);
    Ok(out)
}
