//! Wire format spoken with the remote evaluation endpoint.
//!
//! Every operation is a snippet of PHP wrapped between two fixed markers.
//! The reply body may carry warnings or HTML around the output, so the
//! markers are searched for rather than expected at fixed offsets.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::warn;

use crate::types::{DirectoryEntry, PARENT_ENTRY};

/// Marker echoed before the operation's output
pub const START_DELIMITER: &str = "_||__";

/// Marker echoed after the operation's output
pub const STOP_DELIMITER: &str = "__||_";

/// Separates the path from the size within one listing record (ASCII US)
pub const FIELD_SEPARATOR: char = '\u{1f}';

/// Terminates one listing record (ASCII RS)
pub const ENTRY_SEPARATOR: char = '\u{1e}';

/// Wrap a payload between the start and stop markers
pub fn frame(code: &str) -> String {
    format!(
        "echo '{}';{}echo '{}';",
        START_DELIMITER, code, STOP_DELIMITER
    )
}

/// Return the text strictly between the first start marker and the first
/// stop marker that follows it, or `None` if either is missing.
pub fn extract_framed(body: &str) -> Option<&str> {
    let start = body.find(START_DELIMITER)? + START_DELIMITER.len();
    let stop = body[start..].find(STOP_DELIMITER)? + start;
    Some(&body[start..stop])
}

/// Escape text for a PHP single-quoted string literal
pub fn php_quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

pub fn getcwd_code() -> String {
    "echo getcwd();".to_string()
}

pub fn list_code(dir: &str) -> String {
    let pattern = php_quote(&join(dir, "*"));
    let fs = FIELD_SEPARATOR as u32;
    let rs = ENTRY_SEPARATOR as u32;
    format!(
        "$p={pattern};\
         foreach(glob($p,GLOB_ONLYDIR) as $f) echo $f.chr({fs}).chr({rs});\
         foreach(array_filter(glob($p),'is_file') as $f) echo $f.chr({fs}).filesize($f).chr({rs});"
    )
}

pub fn read_code(path: &str) -> String {
    format!(
        "echo base64_encode(file_get_contents({}));",
        php_quote(path)
    )
}

pub fn write_code(path: &str, contents: &[u8]) -> String {
    format!(
        "file_put_contents({}, base64_decode('{}'));",
        php_quote(path),
        STANDARD.encode(contents)
    )
}

pub fn delete_code(path: &str) -> String {
    format!("unlink({});", php_quote(path))
}

/// Parse the output of [`list_code`] into entries
///
/// Records with an empty size field are directories, numeric sizes are
/// files. Anything else is skipped.
pub fn parse_listing(output: &str) -> Vec<DirectoryEntry> {
    let mut entries = Vec::new();

    for record in output.split(ENTRY_SEPARATOR) {
        if record.is_empty() {
            continue;
        }

        let Some((path, size)) = record.split_once(FIELD_SEPARATOR) else {
            warn!("skipping listing record without size field: {:?}", record);
            continue;
        };

        let name = base_name(path);
        if name.is_empty() {
            warn!("skipping listing record without a name: {:?}", record);
            continue;
        }

        if size.is_empty() {
            entries.push(DirectoryEntry::directory(name));
        } else {
            match size.trim().parse::<u64>() {
                Ok(bytes) => entries.push(DirectoryEntry::file(name, bytes)),
                Err(_) => warn!("skipping {:?}: unparseable size {:?}", name, size),
            }
        }
    }

    entries
}

/// Last path component, accepting either separator
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Remote paths always use `/`; Windows hosts accept it as well
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Join a remote directory with a bare name
pub fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Remote parent directory; roots are their own parent
pub fn parent(dir: &str) -> String {
    if is_root(dir) {
        return dir.to_string();
    }

    let trimmed = if dir.len() > 1 {
        dir.trim_end_matches('/')
    } else {
        dir
    };

    match trimmed.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => trimmed[..idx].to_string(),
        None => trimmed.to_string(),
    }
}

/// `/` and bare drive designators such as `C:` have no parent entry
pub fn is_root(dir: &str) -> bool {
    dir == "/" || dir.ends_with(':')
}

/// Resolve a navigation target against a remote directory
pub fn navigate(dir: &str, target: &str) -> String {
    if target == PARENT_ENTRY {
        parent(dir)
    } else {
        join(dir, target)
    }
}
