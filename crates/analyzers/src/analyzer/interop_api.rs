use super::{confirm, is_name_suffix, Analyzer, NodeAnalyzer, NodeContext, INTEROP_API_ID, UPGRADE_CATEGORY};
use crate::compilation::Compilation;
use crate::diagnostic::{Diagnostic, DiagnosticDescriptor, FixHint, Severity};
use crate::name_matcher::NameMatcher;
use crate::syntax::NameContext;

pub const INTEROP_API_DOCUMENTATION_URL: &str =
    "https://learn.microsoft.com/windows/apps/develop/ui-input/display-ui-objects#winrt-classes-that-use-iinitializewithwindow";

/// A UWP API that needs a window handle once the app runs on the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteropApi {
    pub type_name: &'static str,
    pub member: &'static str,
    pub replacement: &'static str,
}

const DEFAULT_APIS: &[InteropApi] = &[
    InteropApi {
        type_name: "Windows.ApplicationModel.DataTransfer.DataTransferManager",
        member: "GetForCurrentView",
        replacement: "DataTransferManagerInterop.GetForWindow",
    },
    InteropApi {
        type_name: "Windows.Graphics.Printing.PrintManager",
        member: "GetForCurrentView",
        replacement: "PrintManagerInterop.GetForWindow",
    },
    InteropApi {
        type_name: "Windows.Media.PlayTo.PlayToManager",
        member: "GetForCurrentView",
        replacement: "PlayToManagerInterop.GetForWindow",
    },
    InteropApi {
        type_name: "Windows.UI.ViewManagement.InputPane",
        member: "GetForCurrentView",
        replacement: "InputPaneInterop.GetForWindow",
    },
    InteropApi {
        type_name: "Windows.UI.ViewManagement.UIViewSettings",
        member: "GetForCurrentView",
        replacement: "UIViewSettingsInterop.GetForWindow",
    },
    InteropApi {
        type_name: "Windows.UI.ApplicationSettings.AccountsSettingsPane",
        member: "GetForCurrentView",
        replacement: "AccountsSettingsPaneInterop.GetForWindow",
    },
    InteropApi {
        type_name: "Windows.Security.Authentication.Web.Core.WebAuthenticationCoreManager",
        member: "RequestTokenAsync",
        replacement: "WebAuthenticationCoreManagerInterop.RequestTokenForWindowAsync",
    },
];

/// Reports UWP APIs bound to the current view, which have no 1:1 desktop
/// equivalent. The paired fixer can only leave an explanatory comment.
#[derive(Debug, Clone)]
pub struct InteropApiAnalyzer {
    apis: Vec<InteropApi>,
}

impl Default for InteropApiAnalyzer {
    fn default() -> Self {
        Self {
            apis: DEFAULT_APIS.to_vec(),
        }
    }
}

impl InteropApiAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apis(&self) -> &[InteropApi] {
        &self.apis
    }

    fn descriptor() -> DiagnosticDescriptor {
        DiagnosticDescriptor::new(
            INTEROP_API_ID,
            "UWP APIs that need a window handle on the desktop",
            UPGRADE_CATEGORY,
            Severity::Warning,
        )
    }
}

impl Analyzer for InteropApiAnalyzer {
    fn name(&self) -> &'static str {
        "interop-api"
    }

    fn descriptors(&self) -> Vec<DiagnosticDescriptor> {
        vec![Self::descriptor()]
    }

    fn start(&self, _compilation: &Compilation) -> Option<Box<dyn NodeAnalyzer>> {
        if self.apis.is_empty() {
            return None;
        }
        let entries = self
            .apis
            .iter()
            .map(|api| (*api, NameMatcher::for_member(api.type_name, api.member)))
            .collect();
        Some(Box::new(InteropNodeAnalyzer {
            descriptor: Self::descriptor(),
            entries,
        }))
    }
}

struct InteropNodeAnalyzer {
    descriptor: DiagnosticDescriptor,
    entries: Vec<(InteropApi, NameMatcher)>,
}

impl NodeAnalyzer for InteropNodeAnalyzer {
    fn analyze_name(&self, context: &NodeContext<'_>, diagnostics: &mut Vec<Diagnostic>) {
        let node = context.node;
        if node.context != NameContext::MemberAccess {
            return;
        }
        let Some(qualifier) = node.qualifier.as_deref() else {
            return;
        };

        let language = context.language();
        let Some((api, matcher)) = self.entries.iter().find(|(api, _)| {
            language.names_equal(&node.simple_name, api.member) && is_name_suffix(qualifier, api.type_name, language)
        }) else {
            return;
        };

        if !confirm(&context.resolve(), matcher, true) {
            return;
        }

        let message = format!(
            "{}.{} is bound to a CoreWindow and is not available to desktop apps. Use {} with the window handle instead.",
            api.type_name, api.member, api.replacement
        );
        let hint = FixHint::explain_only().with_documentation_url(INTEROP_API_DOCUMENTATION_URL);
        diagnostics.push(
            Diagnostic::new(&self.descriptor, message, context.location(node.full_span)).with_fix_hint(&hint),
        );
    }
}
