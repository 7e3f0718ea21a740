use chrono::NaiveDateTime;

bitflags! {
    /// State reported by the update service for an update.
    pub struct UpdateFlags: u8 {
        /// Must be installed before any other update
        const MANDATORY  = 1 << 0;
        /// Files have been downloaded to the local cache
        const DOWNLOADED = 1 << 1;
        /// Installed on this machine
        const INSTALLED  = 1 << 2;
        /// Hidden from automatic installation
        const HIDDEN     = 1 << 3;
    }
}

impl Default for UpdateFlags {
    fn default() -> Self { UpdateFlags::empty() }
}

/// A read-only snapshot of one update, as returned by a search.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Update {
    pub categories:             Vec<Box<str>>,
    pub description:            Box<str>,
    pub flags:                  UpdateFlags,
    pub kb_article_ids:         Vec<Box<str>>,
    pub last_deployment_change: Option<NaiveDateTime>,
    pub more_info_urls:         Vec<Box<str>>,
    pub support_url:            Box<str>,
    pub title:                  Box<str>,
}

impl Update {
    pub fn is_mandatory(&self) -> bool { self.flags.contains(UpdateFlags::MANDATORY) }

    pub fn is_downloaded(&self) -> bool { self.flags.contains(UpdateFlags::DOWNLOADED) }

    pub fn is_installed(&self) -> bool { self.flags.contains(UpdateFlags::INSTALLED) }

    pub fn is_hidden(&self) -> bool { self.flags.contains(UpdateFlags::HIDDEN) }
}
