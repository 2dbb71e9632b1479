use serde::{Deserialize, Serialize};

/// One entry of a `listDocsByPath` response.
///
/// The kernel returns many more fields (icon, size, timestamps); only the ones the
/// tree walk needs are kept.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct FileTreeNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "subFileCount", default)]
    pub sub_file_count: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Notebook {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub closed: bool,
}

/// `getBlockInfo` payload. `box` is the owning notebook id.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct BlockInfo {
    #[serde(rename = "box", default)]
    pub box_id: String,
    #[serde(rename = "rootID", default)]
    pub root_id: String,
    #[serde(default)]
    pub path: String,
}

/// Position of the open document within its notebook, as shown by the indicator.
///
/// A zero in either field means "not applicable" and suppresses rendering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct NavigationState {
    pub current_position: usize,
    pub total_count: usize,
}

impl NavigationState {
    pub fn new(current_position: usize, total_count: usize) -> Self {
        Self {
            current_position,
            total_count,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.current_position == 0 || self.total_count == 0
    }

    pub fn indicator(&self) -> String {
        format!("{} / {}", self.current_position, self.total_count)
    }

    pub fn prev_disabled(&self) -> bool {
        self.current_position <= 1
    }

    pub fn next_disabled(&self) -> bool {
        self.current_position >= self.total_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_tree_node_contract_deserialize() {
        // Trimmed from a real listDocsByPath response.
        let json = r#"{
            "path": "/20240101120000-abcdefg.sy",
            "name": "Intro.sy",
            "icon": "",
            "name1": "",
            "alias": "",
            "memo": "",
            "bookmark": "",
            "id": "20240101120000-abcdefg",
            "count": 0,
            "size": 1024,
            "hSize": "1.0 kB",
            "mtime": 1704081600,
            "ctime": 1704081600,
            "hMtime": "1 day ago",
            "hCtime": "2024-01-01 12:00:00",
            "sort": 0,
            "subFileCount": 3,
            "hidden": false,
            "newFlashcardCount": 0,
            "dueFlashcardCount": 0,
            "flashcardCount": 0
        }"#;
        let node: FileTreeNode = serde_json::from_str(json).expect("node should parse");
        assert_eq!(node.id, "20240101120000-abcdefg");
        assert_eq!(node.path, "/20240101120000-abcdefg.sy");
        assert_eq!(node.sub_file_count, 3);
    }

    #[test]
    fn test_file_tree_node_missing_fields_default() {
        let node: FileTreeNode = serde_json::from_str(r#"{"name": "x"}"#).expect("should parse");
        assert!(node.id.is_empty());
        assert_eq!(node.sub_file_count, 0);
    }

    #[test]
    fn test_block_info_contract_deserialize() {
        let json = r#"{
            "box": "20231201000000-nbnbnbn",
            "path": "/20240101120000-abcdefg.sy",
            "rootID": "20240101120000-abcdefg",
            "rootTitle": "Intro",
            "rootChildID": "20240101120001-zzzzzzz",
            "rootIcon": ""
        }"#;
        let info: BlockInfo = serde_json::from_str(json).expect("block info should parse");
        assert_eq!(info.box_id, "20231201000000-nbnbnbn");
        assert_eq!(info.root_id, "20240101120000-abcdefg");
    }

    #[test]
    fn test_navigation_state_sentinel() {
        assert!(NavigationState::new(0, 5).is_sentinel());
        assert!(NavigationState::new(3, 0).is_sentinel());
        assert!(NavigationState::default().is_sentinel());
        assert!(!NavigationState::new(1, 1).is_sentinel());
    }

    #[test]
    fn test_navigation_state_boundaries() {
        let first = NavigationState::new(1, 5);
        assert!(first.prev_disabled());
        assert!(!first.next_disabled());

        let last = NavigationState::new(5, 5);
        assert!(!last.prev_disabled());
        assert!(last.next_disabled());

        let middle = NavigationState::new(2, 5);
        assert!(!middle.prev_disabled());
        assert!(!middle.next_disabled());

        let single = NavigationState::new(1, 1);
        assert!(single.prev_disabled());
        assert!(single.next_disabled());
    }

    #[test]
    fn test_navigation_state_indicator() {
        assert_eq!(NavigationState::new(2, 5).indicator(), "2 / 5");
    }
}
