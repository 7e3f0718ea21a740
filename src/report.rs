use crate::{common, Error, Query, Update, UpdateSearcher, UpdateService};
use console::Term;
use std::io::{self, Write};

pub const BANNER: &str = "Windows Update Agent Demonstration";

pub const FINISHED: &str = "Finished displaying all update information.";

pub const NO_UPDATES: &str = "No updates found.";

/// Controls what the report prints, and whether it waits on the user before returning.
#[derive(Clone, Debug)]
pub struct Options {
    pub acknowledge: bool,
    pub banner:      bool,
    pub queries:     Vec<Query>,
}

impl Default for Options {
    fn default() -> Self { Self { acknowledge: true, banner: true, queries: Query::defaults() } }
}

/// Prints the updates known to an update service, one section per query.
pub struct Report<W> {
    out:     W,
    options: Options,
}

impl<W: Write> Report<W> {
    pub fn new(out: W) -> Self { Self::with_options(out, Options::default()) }

    pub fn with_options(out: W, options: Options) -> Self { Self { out, options } }

    pub fn into_inner(self) -> W { self.out }

    /// Opens a session with the service and prints every query's results.
    ///
    /// A failed query is reported in its section and the remaining queries still run. Failing
    /// to open the session aborts the report before any query is made.
    pub fn run<S: UpdateService>(&mut self, service: &S) -> Result<(), Error> {
        let Self { out, options } = self;

        if options.banner {
            write_banner(out).map_err(Error::Output)?;
        }

        let searcher = service.open()?;
        info!("opened update session");

        for query in &options.queries {
            write_section(out, &searcher, query).map_err(Error::Output)?;
        }

        writeln!(out, "{}", FINISHED).and_then(|_| out.flush()).map_err(Error::Output)?;

        if options.acknowledge {
            Term::stdout().read_key().map_err(Error::Acknowledge)?;
        }

        Ok(())
    }
}

fn write_banner<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", BANNER)?;
    writeln!(out, "{}", "-".repeat(BANNER.len()))
}

fn write_section<W: Write, S: UpdateSearcher>(
    out: &mut W,
    searcher: &S,
    query: &Query,
) -> io::Result<()> {
    writeln!(out, "\nChecking for {}...", query.title)?;
    out.flush()?;

    match searcher.search(&query.criteria) {
        Ok(updates) => {
            info!("found {} updates matching {}", updates.len(), query.criteria);
            write_updates(out, &query.title, &updates)
        }
        Err(why) => {
            let why = common::error_chain(&why);
            warn!("{}", why);
            writeln!(out, "Error while searching for {}: {}", query.title.to_lowercase(), why)
        }
    }
}

fn write_updates<W: Write>(out: &mut W, title: &str, updates: &[Update]) -> io::Result<()> {
    writeln!(out, "\n--- {} ---", title)?;
    if updates.is_empty() {
        return writeln!(out, "{}", NO_UPDATES);
    }

    for (id, update) in updates.iter().enumerate() {
        write_update(out, id + 1, update)?;
    }

    Ok(())
}

fn write_update<W: Write>(out: &mut W, number: usize, update: &Update) -> io::Result<()> {
    writeln!(out, "Update {}:", number)?;
    writeln!(out, "- Title: {}", update.title)?;
    writeln!(out, "- Description: {}", update.description)?;
    writeln!(out, "- KB Article IDs: {}", common::join_values(&update.kb_article_ids))?;
    writeln!(out, "- Categories: {}", common::join_values(&update.categories))?;
    writeln!(out, "- More Info URL: {}", common::join_values(&update.more_info_urls))?;
    writeln!(out, "- Support URL: {}", update.support_url)?;
    writeln!(out, "- Is Mandatory: {}", update.is_mandatory())?;
    writeln!(out, "- Is Downloaded: {}", update.is_downloaded())?;
    writeln!(out, "- Is Installed: {}", update.is_installed())?;
    writeln!(out, "- Is Hidden: {}", update.is_hidden())?;
    writeln!(
        out,
        "- Last Deployment Change Time: {}",
        common::format_timestamp(update.last_deployment_change)
    )?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Criteria, Fault, UpdateFlags, HIDDEN, INSTALLED, NOT_INSTALLED};
    use std::{cell::RefCell, rc::Rc};

    type Outcome = Result<Vec<Update>, &'static str>;

    /// Stands in for the update service, answering each criteria with a canned outcome.
    #[derive(Default)]
    struct FakeService {
        session_fault: Option<&'static str>,
        outcomes:      Vec<(&'static str, Outcome)>,
        searched:      Rc<RefCell<Vec<String>>>,
    }

    impl FakeService {
        fn with(mut self, criteria: &'static str, outcome: Outcome) -> Self {
            self.outcomes.push((criteria, outcome));
            self
        }

        fn searched(&self) -> Vec<String> { self.searched.borrow().clone() }
    }

    struct FakeSearcher {
        outcomes: Vec<(&'static str, Outcome)>,
        searched: Rc<RefCell<Vec<String>>>,
    }

    impl UpdateService for FakeService {
        type Searcher = FakeSearcher;

        fn open(&self) -> Result<FakeSearcher, Error> {
            if let Some(message) = self.session_fault {
                return Err(Error::Session(Fault::new(message)));
            }

            Ok(FakeSearcher { outcomes: self.outcomes.clone(), searched: self.searched.clone() })
        }
    }

    impl UpdateSearcher for FakeSearcher {
        fn search(&self, criteria: &Criteria) -> Result<Vec<Update>, Error> {
            self.searched.borrow_mut().push(criteria.to_string());

            let expression: &str = criteria;
            match self.outcomes.iter().find(|(key, _)| *key == expression) {
                Some((_, Ok(updates))) => Ok(updates.clone()),
                Some((_, Err(message))) => Err(Error::Search(criteria.clone(), Fault::new(*message))),
                None => Ok(Vec::new()),
            }
        }
    }

    fn update(title: &str) -> Update { Update { title: title.into(), ..Default::default() } }

    fn render(service: &FakeService) -> (Result<(), Error>, String) {
        let options = Options { acknowledge: false, ..Options::default() };
        let mut report = Report::with_options(Vec::new(), options);
        let result = report.run(service);
        let output = String::from_utf8(report.into_inner()).expect("report is not UTF-8");
        (result, output)
    }

    #[test]
    fn empty_results_print_no_updates() {
        let service = FakeService::default();
        let (result, output) = render(&service);

        assert!(result.is_ok());
        assert_eq!(output.matches(NO_UPDATES).count(), 3);
        assert!(!output.contains("Update 1:"));

        for title in &["Available Updates", "Installed Updates", "Hidden Updates"] {
            let section = format!("--- {} ---\n{}\n", title, NO_UPDATES);
            assert!(output.contains(&section), "missing empty section for {}", title);
        }
    }

    #[test]
    fn records_keep_service_order() {
        let service = FakeService::default()
            .with(INSTALLED, Ok(vec![update("First"), update("Second"), update("Third")]));
        let (_, output) = render(&service);

        assert_eq!(output.matches("- Title: ").count(), 3);
        assert!(output.contains("Update 3:"));
        assert!(!output.contains("Update 4:"));

        let first = output.find("- Title: First").unwrap();
        let second = output.find("- Title: Second").unwrap();
        let third = output.find("- Title: Third").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn multi_valued_fields_are_joined() {
        let record = Update {
            kb_article_ids: vec!["KB1".into(), "KB2".into()],
            more_info_urls: vec!["https://a.example".into(), "https://b.example".into()],
            ..update("Joined")
        };

        let service = FakeService::default().with(NOT_INSTALLED, Ok(vec![record]));
        let (_, output) = render(&service);

        assert!(output.contains("- KB Article IDs: KB1, KB2\n"));
        assert!(output.contains("- Categories: \n"));
        assert!(output.contains("- More Info URL: https://a.example, https://b.example\n"));
    }

    #[test]
    fn query_fault_is_isolated() {
        let service = FakeService::default()
            .with(INSTALLED, Err("boom"))
            .with(HIDDEN, Ok(vec![update("Hidden driver")]));
        let (result, output) = render(&service);

        assert!(result.is_ok());
        assert!(output.contains(
            "Error while searching for installed updates: search for `IsInstalled=1` failed: boom\n"
        ));
        assert!(!output.contains("--- Installed Updates ---"));
        assert!(output.contains("--- Hidden Updates ---\nUpdate 1:\n- Title: Hidden driver\n"));
        assert!(output.ends_with(&format!("{}\n", FINISHED)));
        assert_eq!(service.searched(), [NOT_INSTALLED, INSTALLED, HIDDEN]);
    }

    #[test]
    fn session_fault_aborts_report() {
        let service = FakeService {
            session_fault: Some("service unavailable"),
            ..FakeService::default().with(NOT_INSTALLED, Ok(vec![update("Never shown")]))
        };
        let (result, output) = render(&service);

        match result {
            Err(Error::Session(fault)) => assert_eq!(&*fault.message, "service unavailable"),
            other => panic!("expected a session error, found {:?}", other),
        }

        assert!(service.searched().is_empty());
        assert!(!output.contains("Checking for"));
        assert!(!output.contains(FINISHED));
    }

    #[test]
    fn flags_and_timestamp_are_printed() {
        let record = Update {
            flags: UpdateFlags::DOWNLOADED | UpdateFlags::INSTALLED,
            last_deployment_change: crate::from_ole_date(45000.5),
            ..update("Cumulative Update")
        };

        let service = FakeService::default().with(INSTALLED, Ok(vec![record]));
        let (_, output) = render(&service);

        assert!(output.contains("- Is Mandatory: false\n"));
        assert!(output.contains("- Is Downloaded: true\n"));
        assert!(output.contains("- Is Installed: true\n"));
        assert!(output.contains("- Is Hidden: false\n"));
        assert!(output.contains("- Last Deployment Change Time: 2023-03-15 12:00:00\n"));
    }

    #[test]
    fn end_to_end() {
        let record = Update { flags: UpdateFlags::MANDATORY, ..update("Update A") };
        let service = FakeService::default().with(NOT_INSTALLED, Ok(vec![record]));
        let (result, output) = render(&service);

        assert!(result.is_ok());
        assert_eq!(
            output,
            concat!(
                "Windows Update Agent Demonstration\n",
                "----------------------------------\n",
                "\n",
                "Checking for Available Updates...\n",
                "\n",
                "--- Available Updates ---\n",
                "Update 1:\n",
                "- Title: Update A\n",
                "- Description: \n",
                "- KB Article IDs: \n",
                "- Categories: \n",
                "- More Info URL: \n",
                "- Support URL: \n",
                "- Is Mandatory: true\n",
                "- Is Downloaded: false\n",
                "- Is Installed: false\n",
                "- Is Hidden: false\n",
                "- Last Deployment Change Time: \n",
                "\n",
                "\n",
                "Checking for Installed Updates...\n",
                "\n",
                "--- Installed Updates ---\n",
                "No updates found.\n",
                "\n",
                "Checking for Hidden Updates...\n",
                "\n",
                "--- Hidden Updates ---\n",
                "No updates found.\n",
                "Finished displaying all update information.\n",
            )
        );
    }
}
