//! State container for the key file picker modal.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use dirs_next::{desktop_dir, document_dir, download_dir, home_dir};
use keysource_types::DirectoryEntry;
use keysource_util::expand_tilde;
use rat_focus::{FocusFlag, HasFocus};
use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{ListItem, ListState},
};

use crate::ui::{components::common::TextInputState, theme::Theme};

/// Quick access shortcut displayed in the file picker sidebar.
#[derive(Debug, Clone)]
pub struct Shortcut {
    /// Label rendered in the shortcut button.
    pub name: String,
    /// Directory opened when the shortcut is pressed.
    pub path: PathBuf,
}

/// UI state backing the file picker modal.
///
/// Tracks the active directory, the highlighted entry, the preview text and the
/// focus graph used for keyboard navigation. Directory listings always start
/// with the parent directory (rendered as `/..`) unless the current directory is
/// a filesystem root.
#[derive(Debug, Clone, Default)]
pub struct FilePickerState {
    cur_dir: Option<PathBuf>,
    dir_contents: Option<Vec<DirectoryEntry>>,
    file_contents: Option<String>,

    allowed_extensions: Vec<&'static str>,
    shortcuts: Vec<Shortcut>,
    list_state: ListState,
    list_items: Vec<ListItem<'static>>,

    path_input_state: TextInputState,
    is_path_input_valid: bool,

    mouse_over_idx: Option<usize>,
    selected_shortcut_idx: Option<usize>,
    selected_file_idx: Option<usize>,
    preview_scroll_offset: u16,
    user_input_error: Option<String>,
    // Focus
    container_focus: FocusFlag,
    pub f_path_input: FocusFlag,
    pub f_list: FocusFlag,
    pub f_preview: FocusFlag,
    pub f_cancel: FocusFlag,
    pub f_confirm: FocusFlag,
    pub shortcuts_focus: Vec<FocusFlag>,
}

impl FilePickerState {
    /// Builds a picker that highlights the given extensions and opens in `start_dir`
    /// (falling back to the home directory).
    pub fn new(allowed_extensions: Vec<&'static str>, start_dir: Option<PathBuf>) -> Self {
        let ssh_dir = home_dir().map(|home| home.join(".ssh")).filter(|dir| dir.is_dir());
        let shortcuts: Vec<Shortcut> = [home_dir(), ssh_dir, desktop_dir(), document_dir(), download_dir()]
            .into_iter()
            .flatten()
            .map(|path| Shortcut {
                name: path
                    .file_name()
                    .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned()),
                path,
            })
            .collect();

        let shortcuts_focus = shortcuts
            .iter()
            .map(|s| FocusFlag::new().with_name(&format!("filepicker.shortcut.{}", &s.name)))
            .collect();

        let cur_dir = start_dir.filter(|dir| dir.is_dir()).or_else(home_dir);
        let selected_shortcut_idx = shortcuts.iter().position(|s| Some(&s.path) == cur_dir.as_ref());

        Self {
            cur_dir,
            allowed_extensions,
            shortcuts,
            shortcuts_focus,
            selected_shortcut_idx,
            container_focus: FocusFlag::new().with_name("filepicker.container"),
            f_path_input: FocusFlag::new().with_name("filepicker.path_input"),
            f_list: FocusFlag::new().with_name("filepicker.list"),
            f_preview: FocusFlag::new().with_name("filepicker.preview"),
            f_cancel: FocusFlag::new().with_name("filepicker.cancel"),
            f_confirm: FocusFlag::new().with_name("filepicker.confirm"),
            ..Default::default()
        }
    }

    pub fn path_input_state_mut(&mut self) -> &mut TextInputState {
        &mut self.path_input_state
    }

    /// Inserts a character at the cursor inside the path input.
    pub fn insert_path_char(&mut self, c: char) {
        self.path_input_state.insert_char(c);
        self.validate_path_input();
    }

    /// Inserts pasted text into the path input. Line breaks are dropped.
    pub fn insert_path_str(&mut self, text: &str) {
        let single_line: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        self.path_input_state.insert_str(&single_line);
        self.validate_path_input();
    }

    pub fn backspace_path_char(&mut self) {
        self.path_input_state.backspace();
        self.validate_path_input();
    }

    pub fn delete_path_char(&mut self) {
        self.path_input_state.delete();
        self.validate_path_input();
    }

    fn validate_path_input(&mut self) {
        self.user_input_error = None;
        self.is_path_input_valid = self.typed_path().is_some_and(|path| path.exists());
    }

    /// The typed path with `~` expanded, when the field is non-empty.
    pub fn typed_path(&self) -> Option<PathBuf> {
        let input = self.path_input_state.input().trim();
        if input.is_empty() { None } else { Some(expand_tilde(input)) }
    }

    /// Shows or clears the inline error rendered beneath the list.
    pub fn set_user_input_error(&mut self, error: Option<String>) {
        self.user_input_error = error;
    }

    pub fn user_input_error(&self) -> Option<&str> {
        self.user_input_error.as_deref()
    }

    /// Stores the preview contents and resets the scroll offset.
    pub fn set_file_contents(&mut self, contents: String) {
        self.file_contents = Some(contents);
        self.preview_scroll_offset = 0;
    }

    pub fn file_contents(&self) -> Option<&str> {
        self.file_contents.as_deref()
    }

    /// Sets the active directory, defaulting to the user's home directory.
    pub fn set_cur_dir(&mut self, maybe_dir: Option<PathBuf>) {
        self.cur_dir = maybe_dir.or_else(home_dir);
        self.set_dir_contents(None);
    }

    pub fn cur_dir(&self) -> Option<&PathBuf> {
        self.cur_dir.as_ref()
    }

    /// Replaces the displayed directory entries and clears the current selection.
    pub fn set_dir_contents(&mut self, maybe_contents: Option<Vec<DirectoryEntry>>) {
        self.dir_contents = maybe_contents;
        self.set_selected_index(None);
    }

    pub fn shortcuts(&self) -> &[Shortcut] {
        &self.shortcuts
    }

    pub fn list_state_mut(&mut self) -> &mut ListState {
        &mut self.list_state
    }

    pub fn list_state_offset(&self) -> usize {
        self.list_state.offset()
    }

    /// Returns the directory entry currently highlighted in the list.
    pub fn selected_file(&self) -> Option<&DirectoryEntry> {
        let idx = self.selected_file_idx?;
        self.dir_contents.as_ref()?.get(idx)
    }

    /// Whether the typed path points at something that exists.
    pub fn is_path_input_valid(&self) -> bool {
        self.is_path_input_valid
    }

    /// Updates the highlighted entry and returns it when the index is selectable.
    ///
    /// Any previous preview is discarded so the new entry's contents can be loaded.
    pub fn set_selected_index(&mut self, maybe_idx: Option<usize>) -> Option<&DirectoryEntry> {
        self.file_contents = None;
        self.user_input_error = None;
        let Some(idx) = maybe_idx else {
            self.list_state.select(None);
            self.selected_file_idx = None;
            return None;
        };

        if !self.can_select_idx(idx) {
            return None;
        }
        self.list_state.select(Some(idx));
        self.selected_file_idx = Some(idx);
        self.path_input_state.clear();
        self.is_path_input_valid = false;
        self.dir_contents.as_ref()?.get(idx)
    }

    /// Key files frequently have no extension (`id_ed25519`), so those are accepted too.
    pub fn is_allowed_extension(&self, extension: Option<&OsStr>) -> bool {
        match extension.map(|ext| ext.to_str()) {
            None => true,
            Some(Some(ext)) => self.allowed_extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)),
            Some(None) => false,
        }
    }

    pub fn set_mouse_over_idx(&mut self, maybe_idx: Option<usize>) {
        self.mouse_over_idx = maybe_idx;
    }

    pub fn mouse_over_idx(&self) -> Option<usize> {
        self.mouse_over_idx
    }

    pub fn scroll_preview_up_by(&mut self, amount: u16) {
        self.preview_scroll_offset = self.preview_scroll_offset.saturating_sub(amount);
    }

    /// Scrolls the preview downward, clamping at the last page.
    pub fn scroll_preview_down_by(&mut self, amount: u16, viewport_size: u16) {
        let line_count = self.file_contents().map_or(0, |contents| contents.lines().count());
        let max_scroll = u16::try_from(line_count).unwrap_or(u16::MAX).saturating_sub(viewport_size);
        self.preview_scroll_offset = self.preview_scroll_offset.saturating_add(amount).min(max_scroll);
    }

    pub fn preview_scroll_offset(&self) -> u16 {
        self.preview_scroll_offset
    }

    pub fn list_items(&self) -> &[ListItem<'static>] {
        &self.list_items
    }

    pub fn shortcuts_focus(&self) -> &[FocusFlag] {
        &self.shortcuts_focus
    }

    /// Activates a shortcut and returns the directory to list.
    pub fn shortcut_pressed(&mut self, idx: usize) -> Option<PathBuf> {
        let path = self.shortcuts.get(idx)?.path.clone();
        self.set_cur_dir(Some(path.clone()));
        self.selected_shortcut_idx = Some(idx);
        Some(path)
    }

    pub fn selected_shortcut_idx(&self) -> Option<usize> {
        self.selected_shortcut_idx
    }

    /// Advances selection to the next selectable entry, wrapping as needed.
    pub fn select_next(&mut self) -> Option<&DirectoryEntry> {
        let len = self.entry_count();
        if len == 0 {
            return None;
        }
        let start = self.list_state.selected().map_or(0, |i| i + 1);
        let proposed = (start..start + len).map(|i| i % len).find(|&i| self.can_select_idx(i))?;
        self.set_selected_index(Some(proposed))
    }

    /// Moves selection to the previous selectable entry, wrapping when necessary.
    pub fn select_previous(&mut self) -> Option<&DirectoryEntry> {
        let len = self.entry_count();
        if len == 0 {
            return None;
        }
        let current = self.list_state.selected().unwrap_or(0);
        let proposed = (1..=len).map(|step| (current + len - step) % len).find(|&i| self.can_select_idx(i))?;
        self.set_selected_index(Some(proposed))
    }

    fn entry_count(&self) -> usize {
        self.dir_contents.as_ref().map_or(0, Vec::len)
    }

    fn can_select_idx(&self, idx: usize) -> bool {
        self.dir_contents
            .as_ref()
            .and_then(|entries| entries.get(idx))
            .is_some_and(|entry| entry.is_directory || self.is_allowed_extension(entry.path.extension()))
    }

    fn is_parent_entry(&self, idx: usize, path: &Path) -> bool {
        idx == 0 && self.cur_dir.as_deref().and_then(Path::parent) == Some(path)
    }

    /// Recomputes the list items from the current listing and selects the first selectable entry.
    pub fn rebuild_list_items(&mut self, theme: &dyn Theme) -> &[ListItem<'static>] {
        self.list_items = match self.dir_contents.as_ref() {
            None => vec![ListItem::new(Line::from(Span::styled(
                "Directory contents unavailable",
                theme.status_error(),
            )))],
            Some(contents) => contents
                .iter()
                .enumerate()
                .map(|(idx, entry)| self.build_list_item(idx, entry, theme))
                .collect(),
        };

        self.list_state.select(None);
        self.select_next();

        &self.list_items
    }

    fn build_list_item(&self, idx: usize, entry: &DirectoryEntry, theme: &dyn Theme) -> ListItem<'static> {
        if self.is_parent_entry(idx, &entry.path) {
            return ListItem::new(Line::from(Span::styled("/..", theme.accent_secondary_style())));
        }
        let name = entry
            .path
            .file_name()
            .map_or_else(|| entry.path.display().to_string(), |name| name.to_string_lossy().into_owned());

        let span = if entry.is_directory {
            Span::styled(format!("/{name}"), theme.accent_secondary_style())
        } else if self.is_allowed_extension(entry.path.extension()) {
            Span::styled(name, theme.status_success())
        } else {
            Span::styled(name, theme.text_secondary_style().add_modifier(Modifier::DIM))
        };
        ListItem::new(Line::from(span))
    }
}

impl HasFocus for FilePickerState {
    fn build(&self, builder: &mut rat_focus::FocusBuilder) {
        let tag = builder.start(self);
        builder.leaf_widget(&self.f_path_input);
        builder.leaf_widget(&self.f_list);
        if self.file_contents.is_some() {
            builder.leaf_widget(&self.f_preview);
        }
        builder.leaf_widget(&self.f_cancel);
        builder.leaf_widget(&self.f_confirm);

        for shortcut in &self.shortcuts_focus {
            builder.leaf_widget(shortcut);
        }
        builder.end(tag);
    }

    fn focus(&self) -> FocusFlag {
        self.container_focus.clone()
    }

    fn area(&self) -> Rect {
        Rect::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::theme::DraculaTheme;
    use std::fs;
    use tempfile::tempdir;

    fn entry(path: PathBuf, is_directory: bool) -> DirectoryEntry {
        DirectoryEntry { path, is_directory }
    }

    #[test]
    fn extensionless_and_key_extensions_are_selectable() {
        let state = FilePickerState::new(vec!["pem", "pub"], None);
        assert!(state.is_allowed_extension(None));
        assert!(state.is_allowed_extension(Some(OsStr::new("PEM"))));
        assert!(!state.is_allowed_extension(Some(OsStr::new("png"))));
    }

    #[test]
    fn starts_in_existing_start_dir() {
        let dir = tempdir().unwrap();
        let state = FilePickerState::new(vec!["pem"], Some(dir.path().to_path_buf()));
        assert_eq!(state.cur_dir(), Some(&dir.path().to_path_buf()));

        let missing = FilePickerState::new(vec!["pem"], Some(dir.path().join("missing")));
        assert_ne!(missing.cur_dir(), Some(&dir.path().join("missing")));
    }

    #[test]
    fn rebuild_selects_first_selectable_entry_and_skips_others() {
        let dir = tempdir().unwrap();
        let theme = DraculaTheme::new();
        let mut state = FilePickerState::new(vec!["pem"], Some(dir.path().to_path_buf()));
        state.set_dir_contents(Some(vec![
            entry(dir.path().join("photo.png"), false),
            entry(dir.path().join("id.pem"), false),
            entry(dir.path().join("notes.doc"), false),
            entry(dir.path().join("id_ed25519"), false),
        ]));
        state.rebuild_list_items(&theme);
        assert_eq!(state.list_items().len(), 4);
        assert_eq!(state.selected_file().map(|e| e.path.clone()), Some(dir.path().join("id.pem")));

        state.select_next();
        assert_eq!(state.selected_file().map(|e| e.path.clone()), Some(dir.path().join("id_ed25519")));
        state.select_next();
        assert_eq!(state.selected_file().map(|e| e.path.clone()), Some(dir.path().join("id.pem")));
        state.select_previous();
        assert_eq!(state.selected_file().map(|e| e.path.clone()), Some(dir.path().join("id_ed25519")));
    }

    #[test]
    fn typed_path_validation_tracks_existence() {
        let dir = tempdir().unwrap();
        let key = dir.path().join("id.pem");
        fs::write(&key, "x").unwrap();

        let mut state = FilePickerState::new(vec!["pem"], None);
        state.insert_path_str(&format!("{}\n", key.display()));
        assert!(state.is_path_input_valid());
        assert_eq!(state.typed_path(), Some(key));

        state.insert_path_char('x');
        assert!(!state.is_path_input_valid());
    }

    #[test]
    fn preview_scroll_is_clamped() {
        let mut state = FilePickerState::new(vec!["pem"], None);
        state.set_file_contents("a\nb\nc\nd\n".to_string());
        state.scroll_preview_down_by(10, 2);
        assert_eq!(state.preview_scroll_offset(), 2);
        state.scroll_preview_up_by(5);
        assert_eq!(state.preview_scroll_offset(), 0);
    }
}
