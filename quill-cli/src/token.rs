use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Session token persisted between invocations.
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(custom_path: Option<PathBuf>) -> Result<Self> {
        let path = match custom_path {
            Some(path) => path,
            None => {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                home.join(".quill_token")
            }
        };

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, token: &str) -> Result<()> {
        fs::write(&self.path, token)
            .with_context(|| format!("Failed to save token to {:?}", self.path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict permissions of {:?}", self.path))?;
        }

        Ok(())
    }

    pub fn load(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(token) => {
                let token = token.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {:?}", self.path)),
        }
    }

    /// Returns whether a token file was removed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {:?}", self.path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let file = TokenFile::new(Some(dir.path().join("token"))).unwrap();

        assert_eq!(file.load().unwrap(), None);
        file.save("abc.def\n").unwrap();
        assert_eq!(file.load().unwrap().as_deref(), Some("abc.def"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(file.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        assert!(file.clear().unwrap());
        assert!(!file.clear().unwrap());
    }
}
