use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const REMOTE_SCRIPT: &str = "/var/tmp/remote_camera_script.sh";

/// Takes the destination url as `$1` and opens an iTerm window running an
/// avfoundation capture that pushes MPEG-TS to it.
const REMOTE_WRAPPER: &str = r#"#!/bin/bash
osascript <<APPLESCRIPT
tell application "iTerm"
    create window with default profile command "/opt/local/bin/ffmpeg -f avfoundation -pixel_format uyvy422 -framerate 30 -video_size 1280x720 -i '0' -c:v libx264 -preset ultrafast -tune zerolatency -pix_fmt yuv420p -f mpegts $1"
end tell
APPLESCRIPT"#;

/// An external program and its argv, run without a local shell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cmd {
    pub program: String,
    pub args: Vec<String>,
}

impl Cmd {
    fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn command(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl Display for Cmd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

pub fn protocol(udp: bool) -> &'static str {
    if udp { "udp" } else { "tcp" }
}

/// Creates the v4l2loopback device `/dev/video2`.
pub fn setup() -> Cmd {
    Cmd::new(
        "sudo",
        [
            "modprobe",
            "v4l2loopback",
            "devices=1",
            "video_nr=2",
            "card_label=Virtual Camera",
            "exclusive_caps=1",
        ],
    )
}

/// Receives a network stream and writes it into the loopback `device`.
pub fn listen(port: u16, udp: bool, device: &str) -> Cmd {
    let mut args = Vec::new();
    if !udp {
        args.extend(["-listen", "1"].map(String::from));
    }
    args.push("-i".to_string());
    args.push(format!("{}://0.0.0.0:{}", protocol(udp), port));
    args.extend(["-f", "v4l2"].map(String::from));
    args.push(device.to_string());
    Cmd::new("ffmpeg", args)
}

/// Writes the capture wrapper script onto `remote`.
pub fn install_remote_script(remote: &str) -> Cmd {
    let script = format!(
        "cat > {path} << 'WRAPPER_EOF'\n{body}\nWRAPPER_EOF\nchmod +x {path}",
        path = REMOTE_SCRIPT,
        body = REMOTE_WRAPPER
    );
    Cmd::new("ssh", [remote.to_string(), script])
}

/// Starts the remote capture, pushing to `destination`.
pub fn run_remote_script(remote: &str, destination: &str) -> Cmd {
    Cmd::new(
        "ssh",
        [remote.to_string(), format!("{} {}", REMOTE_SCRIPT, destination)],
    )
}

pub fn stream_destination(local: &str, port: u16, udp: bool) -> String {
    format!("{}://{}:{}", protocol(udp), local, port)
}

/// Runs the camfeed web server against `device` at 1280x720.
pub fn web(server: PathBuf, device: &str, web_port: u16) -> Cmd {
    Cmd::new(
        server.to_string_lossy(),
        [
            "--device".to_string(),
            device.to_string(),
            "--port".to_string(),
            web_port.to_string(),
            "--width".to_string(),
            "1280".to_string(),
            "--height".to_string(),
            "720".to_string(),
        ],
    )
}

/// The `camfeed` binary next to this executable, else whatever `PATH` resolves.
pub fn server_binary() -> PathBuf {
    let name = format!("camfeed{}", std::env::consts::EXE_SUFFIX);
    std::env::current_exe()
        .ok()
        .map(|exe| exe.with_file_name(&name))
        .filter(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from(name))
}
