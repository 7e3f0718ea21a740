//! Access to the Windows Update Agent through its COM automation interfaces.

use crate::{Criteria, Error, Update, UpdateSearcher, UpdateService};

/// The Windows Update Agent that ships with the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct WindowsUpdateAgent;

impl UpdateService for WindowsUpdateAgent {
    type Searcher = AgentSearcher;

    #[cfg(windows)]
    fn open(&self) -> Result<AgentSearcher, Error> { AgentSearcher::new() }

    #[cfg(not(windows))]
    fn open(&self) -> Result<AgentSearcher, Error> { Err(Error::Unsupported) }
}

#[cfg(not(windows))]
#[derive(Debug)]
pub struct AgentSearcher(());

#[cfg(not(windows))]
impl UpdateSearcher for AgentSearcher {
    fn search(&self, _criteria: &Criteria) -> Result<Vec<Update>, Error> { Err(Error::Unsupported) }
}

#[cfg(windows)]
pub use self::wua::AgentSearcher;

#[cfg(windows)]
mod wua {
    use super::*;
    use crate::{common, Fault, UpdateFlags};
    use windows::{
        core::{Result as ComResult, BSTR},
        Win32::{
            Foundation::VARIANT_BOOL,
            System::{
                Com::{
                    CoCreateInstance, CoInitializeEx, CoUninitialize, CLSCTX_INPROC_SERVER,
                    COINIT_MULTITHREADED,
                },
                UpdateAgent::{
                    ICategoryCollection, IStringCollection, IUpdate, IUpdateSearcher,
                    IUpdateSession, UpdateSession,
                },
            },
        },
    };

    /// Keeps COM initialized on this thread until dropped.
    struct Apartment;

    impl Apartment {
        fn enter() -> Result<Self, Error> {
            unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) }
                .ok()
                .map_err(|why| Error::ComInit(why.into()))?;

            Ok(Apartment)
        }
    }

    impl Drop for Apartment {
        fn drop(&mut self) { unsafe { CoUninitialize() } }
    }

    /// A searcher created from an update session.
    ///
    /// Fields drop in declaration order, which releases the COM objects before the apartment.
    pub struct AgentSearcher {
        searcher:   IUpdateSearcher,
        _session:   IUpdateSession,
        _apartment: Apartment,
    }

    impl AgentSearcher {
        pub(super) fn new() -> Result<Self, Error> {
            let apartment = Apartment::enter()?;

            let session: IUpdateSession =
                unsafe { CoCreateInstance(&UpdateSession, None, CLSCTX_INPROC_SERVER) }
                    .map_err(|why| Error::Session(why.into()))?;

            let searcher = unsafe { session.CreateUpdateSearcher() }
                .map_err(|why| Error::CreateSearcher(why.into()))?;

            Ok(Self { searcher, _session: session, _apartment: apartment })
        }
    }

    impl UpdateSearcher for AgentSearcher {
        fn search(&self, criteria: &Criteria) -> Result<Vec<Update>, Error> {
            let expression: &str = criteria;
            info!("searching for updates matching {}", expression);

            let updates = unsafe {
                self.searcher.Search(&BSTR::from(expression)).and_then(|result| result.Updates())
            }
            .map_err(|why| Error::Search(criteria.clone(), Fault::from(why)))?;

            let count = property("Count", unsafe { updates.Count() })?;

            (0..count)
                .map(|index| property("Item", unsafe { updates.get_Item(index) }))
                .map(|update| update.and_then(|update| read_update(&update)))
                .collect()
        }
    }

    fn read_update(update: &IUpdate) -> Result<Update, Error> {
        unsafe {
            let mut flags = UpdateFlags::empty();
            flags.set(UpdateFlags::MANDATORY, flag("IsMandatory", update.IsMandatory())?);
            flags.set(UpdateFlags::DOWNLOADED, flag("IsDownloaded", update.IsDownloaded())?);
            flags.set(UpdateFlags::INSTALLED, flag("IsInstalled", update.IsInstalled())?);
            flags.set(UpdateFlags::HIDDEN, flag("IsHidden", update.IsHidden())?);

            let changed = property("LastDeploymentChangeTime", update.LastDeploymentChangeTime())?;

            Ok(Update {
                categories: update.Categories().and_then(|c| categories(&c)).unwrap_or_else(|why| {
                    debug!("unable to read Categories: {}", why);
                    Vec::new()
                }),
                description: text("Description", update.Description())?,
                flags,
                kb_article_ids: strings("KBArticleIDs", update.KBArticleIDs()),
                last_deployment_change: common::from_ole_date(changed),
                more_info_urls: strings("MoreInfoUrls", update.MoreInfoUrls()),
                support_url: text("SupportUrl", update.SupportUrl())?,
                title: text("Title", update.Title())?,
            })
        }
    }

    fn property<T>(name: &'static str, result: ComResult<T>) -> Result<T, Error> {
        result.map_err(|why| Error::Property(name, why.into()))
    }

    fn flag(name: &'static str, result: ComResult<VARIANT_BOOL>) -> Result<bool, Error> {
        property(name, result).map(|value| value.as_bool())
    }

    fn text(name: &'static str, result: ComResult<BSTR>) -> Result<Box<str>, Error> {
        property(name, result).map(|value| value.to_string().into())
    }

    /// A missing string collection is rendered as empty rather than failing the search.
    fn strings(name: &'static str, result: ComResult<IStringCollection>) -> Vec<Box<str>> {
        let read = |collection: IStringCollection| unsafe {
            (0..collection.Count()?)
                .map(|index| collection.get_Item(index).map(|value| value.to_string().into()))
                .collect::<ComResult<Vec<Box<str>>>>()
        };

        result.and_then(read).unwrap_or_else(|why| {
            debug!("unable to read {}: {}", name, why);
            Vec::new()
        })
    }

    unsafe fn categories(collection: &ICategoryCollection) -> ComResult<Vec<Box<str>>> {
        (0..collection.Count()?)
            .map(|index| {
                collection
                    .get_Item(index)
                    .and_then(|category| category.Name())
                    .map(|name| name.to_string().into())
            })
            .collect()
    }
}
