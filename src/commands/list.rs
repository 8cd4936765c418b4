use anyhow::Result;
use log::debug;

use crate::{
    collect::{LinkCollector, PageFetcher, SearchScope},
    model::{InstallationCandidate, canonicalize_name},
    runtime::Runtime,
};

use super::{FinderOptions, config::Config, prepare_finder};

/// List every usable candidate for a project, best source order first.
#[tracing::instrument(skip(runtime, scope, options))]
pub async fn list<R: Runtime + 'static>(
    runtime: R,
    scope: SearchScope,
    project: &str,
    options: &FinderOptions,
    json: bool,
) -> Result<()> {
    let config = Config::new(runtime, scope)?;
    let candidates = run(&config.collector, project, options).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
        return Ok(());
    }

    if candidates.is_empty() {
        println!("No candidates found for {}.", project);
        return Ok(());
    }
    for candidate in &candidates {
        println!("{}", candidate);
    }
    Ok(())
}

pub(crate) async fn run<R: Runtime, F: PageFetcher>(
    collector: &LinkCollector<R, F>,
    project: &str,
    options: &FinderOptions,
) -> Result<Vec<InstallationCandidate>> {
    let project = canonicalize_name(project);
    let finder = prepare_finder(collector, &[project.clone()], options).await?;
    let candidates = finder.find_all_candidates(&project);
    debug!("Found {} candidate(s) for {}", candidates.len(), project);
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::{IndexPage, MockPageFetcher};
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;

    fn index_collector(page: &'static str) -> LinkCollector<MockRuntime, MockPageFetcher> {
        let runtime = MockRuntime::new();
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch_page()
            .with(eq("https://index.example.com/simple/zope-interface/"))
            .times(1)
            .returning(move |url| {
                Ok(Some(IndexPage {
                    url: url.to_string(),
                    content: page.to_string(),
                }))
            });
        let scope = SearchScope::new(
            Vec::new(),
            vec!["https://index.example.com/simple".into()],
        );
        LinkCollector::new(runtime, fetcher, scope)
    }

    #[tokio::test]
    async fn test_list_from_index() {
        // --- Setup ---
        let collector = index_collector(
            r#"
            <a href="/files/zope.interface-5.0.tar.gz">a</a>
            <a href="/files/zope.interface-5.1.tar.gz" data-yanked="broken">b</a>
            <a href="/files/zope.interface-6.0-py3-none-any.whl">c</a>
            <a href="/files/zope.interface-6.0-cp27-cp27mu-manylinux1_i686.whl">d</a>
            <a href="/files/other-1.0.tar.gz">e</a>
            "#,
        );

        // --- Execute ---
        let candidates = run(&collector, "Zope.Interface", &FinderOptions::default())
            .await
            .unwrap();

        // --- Verify ---
        let versions: Vec<String> = candidates
            .iter()
            .map(|c| c.version().to_string())
            .collect();
        assert_eq!(versions, vec!["5.0", "6.0"]);
        assert!(candidates[1].link().url().ends_with(".whl"));
    }

    #[tokio::test]
    async fn test_list_ignores_prerelease_policy() {
        let collector = index_collector(r#"<a href="zope.interface-7.0a1.tar.gz">a</a>"#);

        let candidates = run(&collector, "zope-interface", &FinderOptions::default())
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].version().is_prerelease());
    }
}
