//! Terminal handling when stdin is a pipe.
//!
//! The normal invocation is `git status | fpp`, which leaves stdin connected
//! to the pipe. Keyboard input then has to come from `/dev/tty`: raw mode is
//! enabled on the tty directly, and event reads temporarily point fd 0 at it.

use crossterm::event::{Event, read};
use std::fs::File;
use std::io;

#[cfg(unix)]
use std::os::unix::io::{AsRawFd, IntoRawFd};

#[cfg(unix)]
pub fn stdin_is_tty() -> bool {
    // SAFETY: isatty is safe to call with any fd
    unsafe { libc::isatty(io::stdin().as_raw_fd()) == 1 }
}

#[cfg(not(unix))]
pub fn stdin_is_tty() -> bool {
    use std::io::IsTerminal;
    io::stdin().is_terminal()
}

#[cfg(unix)]
fn open_tty() -> io::Result<File> {
    File::options()
        .read(true)
        .write(true)
        .open("/dev/tty")
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("cannot open /dev/tty: {e}. Interactive mode requires a terminal."),
            )
        })
}

/// Enable raw mode on stdin, or on `/dev/tty` when stdin is piped.
#[cfg(unix)]
pub fn enable_raw_mode() -> io::Result<()> {
    if stdin_is_tty() {
        return crossterm::terminal::enable_raw_mode();
    }
    let tty = open_tty()?;
    let fd = tty.as_raw_fd();
    let mut termios = std::mem::MaybeUninit::<libc::termios>::uninit();
    // SAFETY: tcgetattr initializes the termios struct on success
    unsafe {
        if libc::tcgetattr(fd, termios.as_mut_ptr()) != 0 {
            return Err(io::Error::last_os_error());
        }
        let mut termios = termios.assume_init();
        libc::cfmakeraw(&mut termios);
        if libc::tcsetattr(fd, libc::TCSANOW, &termios) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn enable_raw_mode() -> io::Result<()> {
    crossterm::terminal::enable_raw_mode()
}

/// Restore cooked mode on whichever device raw mode was enabled on.
#[cfg(unix)]
pub fn disable_raw_mode() -> io::Result<()> {
    if stdin_is_tty() {
        return crossterm::terminal::disable_raw_mode();
    }
    let Ok(tty) = open_tty() else {
        return Ok(());
    };
    let fd = tty.as_raw_fd();
    let mut termios = std::mem::MaybeUninit::<libc::termios>::uninit();
    // SAFETY: tcgetattr initializes the termios struct on success
    unsafe {
        if libc::tcgetattr(fd, termios.as_mut_ptr()) == 0 {
            let mut termios = termios.assume_init();
            termios.c_lflag |= libc::ICANON | libc::ECHO | libc::ISIG;
            libc::tcsetattr(fd, libc::TCSANOW, &termios);
        }
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn disable_raw_mode() -> io::Result<()> {
    crossterm::terminal::disable_raw_mode()
}

/// Run a crossterm input call with fd 0 pointed at `/dev/tty`, restoring the
/// original stdin afterwards even when the call fails.
#[cfg(unix)]
fn with_tty_stdin<T>(call: impl FnOnce() -> io::Result<T>) -> io::Result<T> {
    if stdin_is_tty() {
        return call();
    }

    // SAFETY: dup/dup2/close manipulate fds we own, with every error path
    // closing what was opened before returning
    unsafe {
        let saved_stdin = libc::dup(0);
        if saved_stdin < 0 {
            return Err(io::Error::last_os_error());
        }
        let tty_fd = match open_tty() {
            Ok(tty) => tty.into_raw_fd(),
            Err(e) => {
                libc::close(saved_stdin);
                return Err(e);
            }
        };
        if libc::dup2(tty_fd, 0) < 0 {
            let err = io::Error::last_os_error();
            libc::close(tty_fd);
            libc::close(saved_stdin);
            return Err(err);
        }
        libc::close(tty_fd);

        let result = call();

        libc::dup2(saved_stdin, 0);
        libc::close(saved_stdin);
        result
    }
}

#[cfg(not(unix))]
fn with_tty_stdin<T>(call: impl FnOnce() -> io::Result<T>) -> io::Result<T> {
    call()
}

/// Blocking event read from the terminal, piped stdin or not.
pub fn read_event() -> io::Result<Event> {
    with_tty_stdin(read)
}
