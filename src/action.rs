use crate::error::Result;
use crate::types::Page;

/// Which search form field receives typed characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Repository,
    Token,
}

#[derive(Debug)]
pub enum Action {
    Quit,
    Back,
    ScrollUp,
    ScrollDown,
    GoToTop,
    GoToBottom,

    // Search form
    Input(char),
    Backspace,
    SwitchField,
    Submit,

    // Paging
    LoadMore,
    PageLoaded { generation: u64, outcome: Result<Page> },

    // Selected issue
    OpenIssue,
    OpenAuthor,
    YankUrl,

    Tick,
    None,
}
