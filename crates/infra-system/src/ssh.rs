// SSH target description
use std::time::Duration;

/// Remote board reachable over ssh with key-based auth
#[derive(Debug, Clone)]
pub struct SshTarget {
    /// ssh client binary
    pub program: String,
    pub user: String,
    pub host: String,
    pub connect_timeout: Duration,
    /// Extra raw ssh arguments, inserted before the destination
    pub extra_args: Vec<String>,
}

impl SshTarget {
    pub fn new(user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            program: "ssh".to_string(),
            user: user.into(),
            host: host.into(),
            connect_timeout: Duration::from_secs(1),
            extra_args: Vec::new(),
        }
    }

    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// Arguments for running `remote_command` on the target
    ///
    /// BatchMode keeps ssh from ever waiting on a password prompt.
    pub fn command_args(&self, remote_command: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.push(self.destination());
        args.push(remote_command.to_string());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args() {
        let mut target = SshTarget::new("root", "10.30.3.51");
        target.extra_args = vec!["-p".to_string(), "2222".to_string()];

        let args = target.command_args("/root/APEDF/scripts/check_progress.sh");

        assert_eq!(
            args,
            vec![
                "-o",
                "ConnectTimeout=1",
                "-o",
                "BatchMode=yes",
                "-p",
                "2222",
                "root@10.30.3.51",
                "/root/APEDF/scripts/check_progress.sh",
            ]
        );
    }

    #[test]
    fn test_sub_second_connect_timeout_rounds_up() {
        let mut target = SshTarget::new("root", "board");
        target.connect_timeout = Duration::from_millis(200);
        assert!(target.command_args("true").contains(&"ConnectTimeout=1".to_string()));
    }
}
