//! External player process handling. The player gets one stream URL as its
//! only argument and all stdio detached; stopping kills and reaps it.

use std::process::{Child, Command, Stdio};

use tracing::{info, warn};

pub struct Player {
    command: String,
    child: Option<Child>,
}

impl Player {
    pub fn new(command: String) -> Self {
        Self {
            command,
            child: None,
        }
    }

    /// Launch the player on the first URL that spawns successfully (the
    /// fallback-to-next policy lives here in the UI, not in the core).
    /// Returns the URL actually being played.
    pub fn play(&mut self, urls: &[String]) -> anyhow::Result<String> {
        self.stop();
        for url in urls {
            match Command::new(&self.command)
                .arg(url)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                Ok(child) => {
                    info!(command = %self.command, url = %url, "player started");
                    self.child = Some(child);
                    return Ok(url.clone());
                }
                Err(err) => {
                    warn!(command = %self.command, url = %url, "player launch failed: {err}");
                }
            }
        }
        anyhow::bail!("could not launch player {:?}", self.command)
    }

    pub fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    /// Reap the child if it exited on its own; true while still playing.
    pub fn is_playing(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(Some(_)) | Err(_) => {
                    self.child = None;
                    false
                }
                Ok(None) => true,
            },
            None => false,
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}
