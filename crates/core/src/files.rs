use staffplay_source::{Candidate, filter_compatible};

/// What the host should do after a set of files was offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Nothing had a notation-file extension.
    NoCompatibleFiles,
    /// Exactly one compatible file; it is loaded right away.
    AutoLoad,
    /// Several compatible files; the user has to pick one.
    Choose(usize),
}

/// The compatible files of the last selection and which one is active.
#[derive(Debug, Default)]
pub struct FileList {
    entries: Vec<Candidate>,
    active: Option<usize>,
}

impl FileList {
    pub fn offer(&mut self, candidates: Vec<Candidate>) -> Offer {
        let offered = candidates.len();
        self.entries = filter_compatible(candidates);
        self.active = None;
        log::info!(
            target: "session",
            "{} of {offered} offered file(s) are notation files",
            self.entries.len()
        );

        match self.entries.len() {
            0 => Offer::NoCompatibleFiles,
            1 => Offer::AutoLoad,
            n => Offer::Choose(n),
        }
    }

    /// Mark `index` as the active entry and return it.
    pub fn activate(&mut self, index: usize) -> Option<&Candidate> {
        if index >= self.entries.len() {
            log::warn!(target: "session", "no file entry {index}");
            return None;
        }
        self.active = Some(index);
        self.entries.get(index)
    }

    pub fn clear_active(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn entries(&self) -> &[Candidate] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
