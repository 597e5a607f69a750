#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddResult {
    Ok,
    Duplicate,
    StartFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemoveResult {
    Ok,
    NotFound,
}
