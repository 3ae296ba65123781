use std::env;
use std::path::{Path, PathBuf};

/// External PDF rasterizers, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PdfRenderer {
    Mutool,
    Pdftoppm,
}

impl PdfRenderer {
    const PREFERENCE: [PdfRenderer; 2] = [PdfRenderer::Mutool, PdfRenderer::Pdftoppm];

    pub(crate) fn program(self) -> &'static str {
        match self {
            PdfRenderer::Mutool => "mutool",
            PdfRenderer::Pdftoppm => "pdftoppm",
        }
    }

    /// First installed renderer with its resolved executable.
    pub(crate) fn detect() -> Option<(PdfRenderer, PathBuf)> {
        let search = env::var_os("PATH")?;
        let dirs: Vec<PathBuf> = env::split_paths(&search).collect();
        Self::PREFERENCE.into_iter().find_map(|renderer| {
            locate(renderer.program(), &dirs).map(|path| (renderer, path))
        })
    }
}

fn locate(program: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let names: Vec<String> = if cfg!(windows) {
        vec![format!("{}.exe", program), program.to_string()]
    } else {
        vec![program.to_string()]
    };
    dirs.iter()
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|candidate| runnable(candidate))
}

fn runnable(path: &Path) -> bool {
    let Ok(metadata) = path.metadata() else {
        return false;
    };
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        metadata.is_file()
    }
}
