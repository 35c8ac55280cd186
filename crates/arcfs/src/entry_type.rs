// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

/// Kind of an archive entry and of the tree node built from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Regular file entry
    File,
    /// Directory entry, declared or synthesized
    Directory,
    /// Symbolic link entry; the target is the entry payload
    Symlink,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::File => "file",
            EntryType::Directory => "directory",
            EntryType::Symlink => "symlink",
        }
    }

    #[must_use]
    pub fn is_file(&self) -> bool {
        *self == EntryType::File
    }

    #[must_use]
    pub fn is_directory(&self) -> bool {
        *self == EntryType::Directory
    }

    #[must_use]
    pub fn is_symlink(&self) -> bool {
        *self == EntryType::Symlink
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(EntryType::File),
            "directory" => Ok(EntryType::Directory),
            "symlink" => Ok(EntryType::Symlink),
            other => Err(format!("Unknown entry type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_parsing() {
        assert_eq!("file".parse::<EntryType>().unwrap(), EntryType::File);
        assert_eq!(
            "directory".parse::<EntryType>().unwrap(),
            EntryType::Directory
        );
        assert_eq!("symlink".parse::<EntryType>().unwrap(), EntryType::Symlink);
        assert!("fifo".parse::<EntryType>().is_err());
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&EntryType::Symlink).unwrap();
        assert_eq!(json, "\"symlink\"");

        let parsed: EntryType = serde_json::from_str("\"directory\"").unwrap();
        assert_eq!(parsed, EntryType::Directory);
    }
}
