//! Applications started as child processes.
//!
//! The launch target is an executable path relative to the cache root.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use relaunch_core::{BoxError, EntryPoint, EntryPointLoader, LaunchContext};
use relaunch_manifest::Manifest;

/// Environment variable telling the child where its artifacts live.
pub const CACHE_ROOT_ENV: &str = "RELAUNCH_CACHE_ROOT";
pub const VERSION_ENV: &str = "RELAUNCH_APP_VERSION";

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLoader;

impl EntryPointLoader for ProcessLoader {
    fn load(&self, cache_root: &Path, manifest: &Manifest) -> Result<Box<dyn EntryPoint>, BoxError> {
        let program = manifest.launch_path(cache_root)?;
        validate(&program)?;
        make_executable(&program)?;
        Ok(Box::new(ProcessEntryPoint::new(program)))
    }
}

fn validate(target: &Path) -> io::Result<()> {
    if !target.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("launch target not found: {}", target.display()),
        ));
    }
    Ok(())
}

/// Transferred artifacts carry no mode bits; grant execute where read is allowed.
#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(path)?.permissions();
    let mode = permissions.mode();
    let wanted = mode | ((mode & 0o444) >> 2);
    if wanted != mode {
        permissions.set_mode(wanted);
        std::fs::set_permissions(path, permissions)?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
    Ok(())
}

pub struct ProcessEntryPoint {
    program: PathBuf,
    command: Option<Command>,
    child:   Option<Child>,
}

impl ProcessEntryPoint {
    fn new(program: PathBuf) -> Self {
        Self {
            program,
            command: None,
            child: None,
        }
    }
}

impl EntryPoint for ProcessEntryPoint {
    fn init(&mut self, context: LaunchContext) -> Result<(), BoxError> {
        let mut command = Command::new(&self.program);
        command
            .args(context.arguments())
            .current_dir(&context.cache_root)
            .env(CACHE_ROOT_ENV, &context.cache_root)
            .env(VERSION_ENV, context.manifest.version().to_string());
        self.command = Some(command);
        Ok(())
    }

    fn start(&mut self) -> Result<(), BoxError> {
        let command = self
            .command
            .as_mut()
            .ok_or("application started before init")?;
        let child = command.spawn()?;
        tracing::info!(pid = child.id(), program = %self.program.display(), "application started");
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        match child.kill() {
            Ok(()) => {}
            // Already exited.
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
            Err(e) => return Err(e.into()),
        }
        child.wait()?;
        Ok(())
    }

    fn try_wait(&mut self) -> Result<Option<i32>, BoxError> {
        let Some(child) = self.child.as_mut() else {
            return Ok(None);
        };
        Ok(child.try_wait()?.map(|status| status.code().unwrap_or(1)))
    }
}
