use pyo3::prelude::*;
use pyo3::types::PyList;
use std::ffi::CStr;
use std::path::{Path, PathBuf};

const PICK_DEVICE_SRC: &CStr = c"
def pick_device():
    import torch
    if torch.backends.mps.is_available():
        return 'mps', 'Apple MPS'
    if torch.cuda.is_available():
        return 'cuda', torch.cuda.get_device_name(0)
    return 'cpu', None
";

/// Put the active virtualenv's site-packages at the front of `sys.path`,
/// so `torch` and `transformers` come from it rather than the system Python.
pub fn setup_python() -> PyResult<()> {
    let Some(venv) = std::env::var_os("VIRTUAL_ENV") else {
        return Ok(());
    };
    let Some(site_packages) = site_packages_dir(Path::new(&venv)) else {
        tracing::warn!("No site-packages under VIRTUAL_ENV={}", venv.to_string_lossy());
        return Ok(());
    };
    let entry = site_packages.to_string_lossy().into_owned();

    Python::attach(|py| {
        let sys_path: Bound<'_, PyList> = py.import("sys")?.getattr("path")?.cast_into()?;
        if !sys_path.contains(entry.as_str())? {
            sys_path.insert(0, entry.as_str())?;
            tracing::info!("Using virtualenv packages from {}", entry);
        }
        Ok(())
    })
}

/// Torch device to load the model on. `None` when torch cannot be imported.
pub fn detect_device() -> Option<String> {
    let picked = Python::attach(|py| -> PyResult<(String, Option<String>)> {
        PyModule::from_code(py, PICK_DEVICE_SRC, c"pick_device.py", c"pick_device")?
            .getattr("pick_device")?
            .call0()?
            .extract()
    });

    match picked {
        Ok((device, name)) => {
            tracing::info!("Stance model device: {} ({})", device, name.as_deref().unwrap_or("no GPU"));
            Some(device)
        }
        Err(e) => {
            tracing::warn!("Device detection failed: {}", e);
            None
        }
    }
}

/// `lib/python3.X/site-packages` on unix, `Lib/site-packages` on Windows.
fn site_packages_dir(venv: &Path) -> Option<PathBuf> {
    let base = std::fs::canonicalize(venv).unwrap_or_else(|_| venv.to_path_buf());

    let unix = std::fs::read_dir(base.join("lib")).ok().and_then(|entries| {
        entries
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with("python"))
            .map(|e| e.path().join("site-packages"))
            .find(|p| p.is_dir())
    });

    unix.or_else(|| Some(base.join("Lib").join("site-packages")).filter(|p| p.is_dir()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_packages_unix_layout() {
        let venv = std::env::temp_dir().join(format!("stance-venv-{}", std::process::id()));
        let sp = venv.join("lib").join("python3.11").join("site-packages");
        std::fs::create_dir_all(&sp).unwrap();

        let found = site_packages_dir(&venv).unwrap();
        assert!(found.ends_with("python3.11/site-packages"));

        std::fs::remove_dir_all(&venv).unwrap();
    }

    #[test]
    fn test_site_packages_missing() {
        let venv = std::env::temp_dir().join("stance-venv-does-not-exist");
        assert!(site_packages_dir(&venv).is_none());
    }
}
