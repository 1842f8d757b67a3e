use serde::Deserialize;

/// Independent undo/redo domains.
///
/// Each key owns its own pair of stacks and its own serialization lane;
/// operations on one key never wait for, or alter, another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKey {
	/// Map canvas edits: layer styling, geometry, layer properties.
	MapEditing,
	/// Data table view settings.
	DataTable,
	/// Shared layout and panel arrangement.
	Layout,
}

impl HistoryKey {
	/// Every key, in declaration order.
	pub const ALL: [Self; 3] = [Self::MapEditing, Self::DataTable, Self::Layout];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::MapEditing => "map_editing",
			Self::DataTable => "data_table",
			Self::Layout => "layout",
		}
	}
}

impl std::fmt::Display for HistoryKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
