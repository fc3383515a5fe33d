//! Runs analyzers over a compilation.

use crate::analyzer::{
    Analyzer, ApiAlertAnalyzer, AttributeUpgradeAnalyzer, InteropApiAnalyzer, NodeAnalyzer, NodeContext,
    TypeUpgradeAnalyzer,
};
use crate::compilation::Compilation;
use crate::diagnostic::Diagnostic;
use crate::error::AnalyzerError;
use crate::syntax::SyntaxTree;
use dotport_core::CancellationToken;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

pub struct AnalysisDriver {
    analyzers: Vec<Arc<dyn Analyzer>>,
    max_workers: usize,
}

impl AnalysisDriver {
    pub fn new(analyzers: Vec<Arc<dyn Analyzer>>) -> Self {
        let max_workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self {
            analyzers,
            max_workers,
        }
    }

    /// Caps the worker threads used when every analyzer is concurrent.
    /// `1` analyzes on the calling thread.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_defaults() -> Self {
        Self::new(vec![
            Arc::new(ApiAlertAnalyzer::new()),
            Arc::new(TypeUpgradeAnalyzer::new()),
            Arc::new(AttributeUpgradeAnalyzer::new()),
            Arc::new(InteropApiAnalyzer::new()),
        ])
    }

    pub fn analyzers(&self) -> &[Arc<dyn Analyzer>] {
        &self.analyzers
    }

    /// Diagnostics for every tree, ordered by file, position and id.
    pub fn analyze(
        &self,
        compilation: &Compilation,
        cancel: &CancellationToken,
    ) -> Result<Vec<Diagnostic>, AnalyzerError> {
        cancel.check()?;

        let started: Vec<Box<dyn NodeAnalyzer>> = self
            .analyzers
            .iter()
            .filter_map(|analyzer| {
                let node_analyzer = analyzer.start(compilation);
                if node_analyzer.is_none() {
                    debug!(analyzer = analyzer.name(), "Analyzer has nothing to do");
                }
                node_analyzer
            })
            .collect();

        if started.is_empty() || compilation.trees().is_empty() {
            return Ok(Vec::new());
        }

        let concurrent = self.max_workers > 1
            && self.analyzers.iter().all(|a| a.concurrent())
            && compilation.trees().len() > 1;
        let mut diagnostics = if concurrent {
            self.analyze_parallel(compilation, &started, cancel)?
        } else {
            let mut all = Vec::new();
            for tree in compilation.trees() {
                all.extend(analyze_tree(compilation, tree, &started, cancel)?);
            }
            all
        };

        diagnostics.sort_by(|a, b| {
            a.location
                .path
                .cmp(&b.location.path)
                .then(a.location.span.start.cmp(&b.location.span.start))
                .then(a.id.cmp(&b.id))
        });
        diagnostics.dedup();

        info!(
            files = compilation.trees().len(),
            diagnostics = diagnostics.len(),
            "Analysis finished"
        );
        Ok(diagnostics)
    }

    /// Workers pull trees by index until none are left or one fails.
    fn analyze_parallel(
        &self,
        compilation: &Compilation,
        started: &[Box<dyn NodeAnalyzer>],
        cancel: &CancellationToken,
    ) -> Result<Vec<Diagnostic>, AnalyzerError> {
        let trees = compilation.trees();
        let workers = self.max_workers.min(trees.len());
        let next = AtomicUsize::new(0);
        debug!(workers, files = trees.len(), "Analyzing in parallel");

        let mut results: Vec<(usize, Result<Vec<Diagnostic>, AnalyzerError>)> = thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    s.spawn(|| {
                        let mut done = Vec::new();
                        loop {
                            let index = next.fetch_add(1, Ordering::Relaxed);
                            let Some(tree) = trees.get(index) else {
                                break;
                            };
                            let result = analyze_tree(compilation, tree, started, cancel);
                            let failed = result.is_err();
                            done.push((index, result));
                            if failed {
                                next.store(trees.len(), Ordering::Relaxed);
                                break;
                            }
                        }
                        done
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(done) => done,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        });

        results.sort_by_key(|(index, _)| *index);
        let mut all = Vec::new();
        for (_, result) in results {
            all.extend(result?);
        }
        Ok(all)
    }
}

fn analyze_tree(
    compilation: &Compilation,
    tree: &SyntaxTree,
    analyzers: &[Box<dyn NodeAnalyzer>],
    cancel: &CancellationToken,
) -> Result<Vec<Diagnostic>, AnalyzerError> {
    cancel.check()?;

    let model = compilation.semantic_model(tree);
    let mut diagnostics = Vec::new();
    for node in tree.names() {
        let context = NodeContext::new(&model, node);
        for analyzer in analyzers {
            analyzer.analyze_name(&context, &mut diagnostics);
        }
    }

    debug!(path = %tree.path().display(), diagnostics = diagnostics.len(), "Analyzed file");
    Ok(diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotport_core::CancellationSource;

    #[derive(Debug)]
    struct Idle;

    impl Analyzer for Idle {
        fn name(&self) -> &'static str {
            "idle"
        }

        fn descriptors(&self) -> Vec<crate::diagnostic::DiagnosticDescriptor> {
            Vec::new()
        }

        fn start(&self, _compilation: &Compilation) -> Option<Box<dyn NodeAnalyzer>> {
            None
        }
    }

    #[test]
    fn test_no_started_analyzers_yields_nothing() {
        let mut compilation = Compilation::new();
        compilation.add_source("a.cs", "class A {}").unwrap();
        let driver = AnalysisDriver::new(vec![Arc::new(Idle)]);
        let diagnostics = driver.analyze(&compilation, &CancellationToken::none()).unwrap();
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_cancelled_before_start() {
        let source = CancellationSource::new();
        source.cancel();
        let compilation = Compilation::new();
        let err = AnalysisDriver::with_defaults()
            .analyze(&compilation, &source.token())
            .unwrap_err();
        assert_eq!(err, AnalyzerError::Cancelled);
    }

    #[test]
    fn test_parallel_matches_sequential_order() {
        let mut compilation = Compilation::new();
        compilation
            .add_source("b.cs", "using System.Web.Mvc;\nclass B { ActionResult X() { return null; } }\n")
            .unwrap();
        compilation
            .add_source("a.cs", "using System.Web.Mvc;\nclass A { ActionResult Y() { return null; } }\n")
            .unwrap();

        let diagnostics = AnalysisDriver::with_defaults()
            .analyze(&compilation, &CancellationToken::none())
            .unwrap();
        let files: Vec<_> = diagnostics
            .iter()
            .map(|d| d.location.path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(files, vec!["a.cs", "b.cs"]);
        assert!(diagnostics.iter().all(|d| d.id == "UA0002"));
    }

    #[test]
    fn test_worker_pool_matches_single_thread() {
        let mut compilation = Compilation::new();
        for i in 0..64 {
            let source = format!(
                "using System.Web.Mvc;\nclass C{i} {{ ActionResult A{i}() {{ return null; }} HtmlHelper h; }}\n"
            );
            compilation.add_source(format!("src/File{i:02}.cs"), source).unwrap();
        }

        let token = CancellationToken::none();
        let single = AnalysisDriver::with_defaults()
            .with_max_workers(1)
            .analyze(&compilation, &token)
            .unwrap();
        let pooled = AnalysisDriver::with_defaults()
            .with_max_workers(3)
            .analyze(&compilation, &token)
            .unwrap();

        assert!(single.len() >= 64);
        assert_eq!(pooled, single);
    }

    #[test]
    fn test_worker_count_is_at_least_one() {
        let driver = AnalysisDriver::with_defaults().with_max_workers(0);
        assert_eq!(driver.max_workers, 1);
    }
}
