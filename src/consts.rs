/// Accounts that never count as thread participants, in addition to any
/// `[bot]`-suffixed login.
pub const MUTED_ACCOUNTS: &[&str] = &["London-Cat"];

/// Pull requests whose author scores strictly below this are closed
/// automatically.
pub const DEFAULT_REPUTATION_THRESHOLD: i64 = -80;

/// How many search hits to classify when counting a user's pull requests.
pub const SEARCHED_PRS_LIMIT: u8 = 100;

/// How many recent pull requests to scan when the search API is unavailable.
pub const SCANNED_PRS_LIMIT: usize = 300;

/// Cap on a user's counted issues.
pub const CREATED_ISSUES_LIMIT: u64 = 100;

/// Cap on the approximate commented-threads count.
pub const COMMENTED_THREADS_LIMIT: u64 = 50;

/// How many comment-search hits get their reactions inspected.
pub const REACTION_ITEMS_LIMIT: u8 = 5;

/// Cap on counted open issues assigned to a user.
pub const ASSIGNED_ISSUES_LIMIT: u64 = 100;

/// How many thread comments are inspected when collecting participants.
pub const THREAD_COMMENTS_LIMIT: u8 = 30;

/// Upper bound on participants per summary, to bound API cost per event.
pub const MAX_PARTICIPANTS: usize = 10;
