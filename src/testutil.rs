//! Stand-ins for the JDK and coreutils binaries, so subprocess plumbing can
//! be tested on machines without a JVM.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Write an executable `/bin/sh` script named `name` into `dir` that prints
/// `stdout` verbatim and exits with `code`. Returns the script path as a
/// string, ready to drop into `ToolsConfig`.
pub fn fake_tool(dir: &Path, name: &str, stdout: &str, code: i32) -> String {
    let path = dir.join(name);
    let script = format!("#!/bin/sh\ncat <<'HEAPSAFE_EOF'\n{}\nHEAPSAFE_EOF\nexit {}\n", stdout, code);
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

/// Script that appends its arguments to `log` so tests can see how it was
/// invoked, then exits with `code`.
pub fn recording_tool(dir: &Path, name: &str, log: &Path, code: i32) -> String {
    let path = dir.join(name);
    let script = format!("#!/bin/sh\necho \"$@\" >> '{}'\nexit {}\n", log.display(), code);
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}
