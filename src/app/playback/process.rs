use std::process::{Command as ProcessCommand, ExitStatus};

use anyhow::{Context, Result};

#[cfg(unix)]
use anyhow::anyhow;
#[cfg(unix)]
use std::os::unix::process::CommandExt;

/// Restores the previous disposition of a signal when dropped.
#[cfg(unix)]
struct SignalDisposition {
    signum: libc::c_int,
    previous: libc::sigaction,
}

#[cfg(unix)]
impl SignalDisposition {
    fn ignore(signum: libc::c_int) -> Result<Self> {
        unsafe {
            let mut ignored: libc::sigaction = std::mem::zeroed();
            ignored.sa_sigaction = libc::SIG_IGN;
            libc::sigemptyset(&mut ignored.sa_mask);

            let mut previous: libc::sigaction = std::mem::zeroed();
            if libc::sigaction(signum, &ignored, &mut previous) != 0 {
                return Err(anyhow!("failed to ignore signal {signum}"));
            }
            Ok(Self { signum, previous })
        }
    }
}

#[cfg(unix)]
impl Drop for SignalDisposition {
    fn drop(&mut self) {
        unsafe {
            let _ = libc::sigaction(self.signum, &self.previous, std::ptr::null_mut());
        }
    }
}

/// Hands the controlling terminal to a child process group and takes it
/// back on drop.
#[cfg(unix)]
struct ForegroundHandoff {
    tty_fd: libc::c_int,
    owner_pgrp: libc::pid_t,
    handed_off: bool,
}

#[cfg(unix)]
impl ForegroundHandoff {
    fn to_group(tty_fd: libc::c_int, owner_pgrp: libc::pid_t, child_pgrp: libc::pid_t) -> Self {
        let handed_off = unsafe { libc::tcsetpgrp(tty_fd, child_pgrp) == 0 };
        Self {
            tty_fd,
            owner_pgrp,
            handed_off,
        }
    }
}

#[cfg(unix)]
impl Drop for ForegroundHandoff {
    fn drop(&mut self) {
        if self.handed_off {
            unsafe {
                let _ = libc::tcsetpgrp(self.tty_fd, self.owner_pgrp);
            }
        }
    }
}

/// Runs the player in the terminal foreground and waits for it. Ctrl+C
/// reaches the player only; aniroll ignores it until the player exits.
#[cfg(unix)]
pub(crate) fn run_player_in_foreground(mut cmd: ProcessCommand) -> Result<ExitStatus> {
    let _sigint = SignalDisposition::ignore(libc::SIGINT)?;

    let tty_fd = libc::STDIN_FILENO;
    let owner_pgrp = unsafe { libc::tcgetpgrp(tty_fd) };
    if owner_pgrp == -1 {
        // No controlling terminal, nothing to hand over.
        return cmd.status().context("failed to launch player");
    }

    let _sigttou = SignalDisposition::ignore(libc::SIGTTOU)?;
    unsafe {
        cmd.pre_exec(|| {
            for signum in [libc::SIGINT, libc::SIGQUIT, libc::SIGTSTP] {
                libc::signal(signum, libc::SIG_DFL);
            }
            if libc::setpgid(0, 0) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let mut child = cmd.spawn().context("failed to spawn player")?;
    let _foreground = ForegroundHandoff::to_group(tty_fd, owner_pgrp, child.id() as libc::pid_t);
    child.wait().context("failed waiting on player")
}

#[cfg(not(unix))]
pub(crate) fn run_player_in_foreground(mut cmd: ProcessCommand) -> Result<ExitStatus> {
    cmd.status().context("failed to launch player")
}
