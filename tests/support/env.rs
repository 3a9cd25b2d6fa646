use std::{
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};

const CONFIG_HOME_ENV: &str = "NEUROINSIGHTS_CONFIG_HOME";

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Points the application directory at `path` until dropped.
pub struct ConfigHomeGuard {
    previous: Option<String>,
    _lock: MutexGuard<'static, ()>,
}

impl ConfigHomeGuard {
    pub fn set(path: PathBuf) -> Self {
        let lock = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        let previous = std::env::var(CONFIG_HOME_ENV).ok();
        // SAFETY: env mutations in tests are serialized by ENV_LOCK.
        unsafe {
            std::env::set_var(CONFIG_HOME_ENV, path);
        }
        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for ConfigHomeGuard {
    fn drop(&mut self) {
        // SAFETY: env mutations in tests are serialized by ENV_LOCK.
        unsafe {
            match self.previous.take() {
                Some(value) => std::env::set_var(CONFIG_HOME_ENV, value),
                None => std::env::remove_var(CONFIG_HOME_ENV),
            }
        }
    }
}
