use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

pub(crate) fn common_setup() {
    // Try init since multiple tests calling `init` will cause an error.
    let _ = pretty_env_logger::try_init();
}

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// A scratch types directory, removed on drop.
pub(crate) struct TempTypesDir(PathBuf);

impl TempTypesDir {
    /// A fresh directory holding `<spec_name>.json`.
    pub(crate) fn with_file(spec_name: &str, json: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "type_registry-{}-{}",
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::Relaxed)
        ));
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(format!("{spec_name}.json")), json).unwrap();

        Self(path)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempTypesDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}
