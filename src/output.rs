//! Writing rendered text to stdout or a target file.

use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::Result;

/// Write `rendered` to `target`, or stdout when there is none.
///
/// A target file is replaced atomically: the text goes to a temporary file
/// in the same directory which is then renamed over the target.
pub fn write_output(target: Option<&Path>, rendered: &str) -> Result<()> {
    let Some(target) = target else {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    };

    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(rendered.as_bytes())?;
    tmp.flush()?;
    if let Some(perms) = target_permissions(target)? {
        tmp.as_file().set_permissions(perms)?;
    }
    tmp.persist(target).map_err(|e| e.error)?;
    debug!(path = %target.display(), bytes = rendered.len(), "wrote output");
    Ok(())
}

// The temp file is created 0600: an existing target keeps its mode, a new
// one gets 0644.
fn target_permissions(target: &Path) -> Result<Option<Permissions>> {
    match fs::metadata(target) {
        Ok(meta) => Ok(Some(meta.permissions())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(new_file_permissions()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn replaces_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.conf");
        std::fs::write(&target, "old content that is longer").unwrap();
        write_output(Some(&target), "new").unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn keeps_target_mode_and_defaults_new_files_to_0644() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;

        let existing = dir.path().join("shared.conf");
        std::fs::write(&existing, "old").unwrap();
        std::fs::set_permissions(&existing, Permissions::from_mode(0o640)).unwrap();
        write_output(Some(&existing), "new").unwrap();
        assert_eq!(mode(&existing), 0o640);

        let fresh = dir.path().join("fresh.conf");
        write_output(Some(&fresh), "x").unwrap();
        assert_eq!(mode(&fresh), 0o644);
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nope").join("out.conf");
        assert!(matches!(
            write_output(Some(&target), "x"),
            Err(crate::errors::TemplateError::Io(_))
        ));
    }
}
