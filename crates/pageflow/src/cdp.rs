//! Chromium backend over the `DevTools` protocol.
//!
//! [`CdpSession`] adapts chromiumoxide's async API to the blocking
//! [`Session`] trait: it owns a Tokio runtime with a single worker, keeps the
//! CDP handler loop and a dialog listener running on it, and blocks on one
//! future per trait call.
//!
//! Element handles are ids into a page-side registry (`window.__pageflow`).
//! Each document's registry draws a random id prefix, so a handle never
//! resolves in a document other than the one it was found in. A handle whose
//! node has left the document, or whose registry vanished with a navigation,
//! reports [`HarnessError::StaleReference`]. Every lookup prunes entries for
//! disconnected nodes, and a node found again keeps its id, so polling does
//! not grow the registry.
//!
//! While a native dialog is open Chromium blocks script evaluation, so only
//! [`Session::is_alert_present`] answers until the dialog is closed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogClosed, EventJavascriptDialogOpening,
};
use chromiumoxide::layout::Point;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::{BrowserSettings, HarnessConfig};
use crate::driver::{BoundingBox, ElementHandle, ScriptArg, Session};
use crate::locator::{js_string, Locator};
use crate::result::{HarnessError, HarnessResult};

const REGISTRY: &str = "(window.__pageflow ||= { prefix: Math.random().toString(36).slice(2, 10), \
     seq: 0, nodes: new Map(), ids: new WeakMap() })";

const INTERACTABLE: &str = r"(() => {
    const s = getComputedStyle(el);
    if (s.display === 'none' || s.visibility === 'hidden' || el.getClientRects().length === 0) {
        return { reason: 'element is not displayed' };
    }
    if (el.disabled) return { reason: 'element is disabled' };
    el.scrollIntoView({ block: 'center', inline: 'center' });
    const r = el.getBoundingClientRect();
    const x = r.left + r.width / 2;
    const y = r.top + r.height / 2;
    const hit = document.elementFromPoint(x, y);
    if (hit && hit !== el && !el.contains(hit)) {
        return { reason: 'element click intercepted by ' + hit.tagName.toLowerCase() };
    }
    return { x, y };
})()";

#[derive(Debug, Deserialize)]
struct Reply<T> {
    #[serde(default)]
    stale: bool,
    value: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Target {
    reason: Option<String>,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
}

/// Live Chromium page implementing [`Session`]
#[derive(Debug)]
pub struct CdpSession {
    runtime: Runtime,
    browser: CdpBrowser,
    page: CdpPage,
    dialog_open: Arc<AtomicBool>,
    tasks: Vec<JoinHandle<()>>,
}

impl CdpSession {
    /// Launch Chromium and open a blank page.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::BrowserLaunch`] if Chromium cannot be started.
    pub fn launch(settings: &BrowserSettings) -> HarnessResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;

        let mut builder = CdpConfig::builder();
        if !settings.headless {
            builder = builder.with_head();
        }
        if !settings.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = settings.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| HarnessError::BrowserLaunch {
                message: e.to_string(),
            })?;

        let (browser, mut handler) =
            runtime
                .block_on(CdpBrowser::launch(config))
                .map_err(|e| HarnessError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handler_task = runtime.spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = runtime
            .block_on(browser.new_page("about:blank"))
            .map_err(|e| HarnessError::BrowserLaunch {
                message: e.to_string(),
            })?;

        let dialog_open = Arc::new(AtomicBool::new(false));
        let dialog_task = runtime.block_on(Self::watch_dialogs(&page, dialog_open.clone()))?;

        info!(headless = settings.headless, "browser launched");
        Ok(Self {
            runtime,
            browser,
            page,
            dialog_open,
            tasks: vec![handler_task, dialog_task],
        })
    }

    /// Launch with configured settings and open the configured login URL
    pub fn from_config(config: &HarnessConfig) -> HarnessResult<Self> {
        let session = Self::launch(&config.browser)?;
        if let Some(url) = &config.base_url {
            session.navigate(url)?;
        }
        Ok(session)
    }

    async fn watch_dialogs(
        page: &CdpPage,
        flag: Arc<AtomicBool>,
    ) -> HarnessResult<JoinHandle<()>> {
        let opened = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(cdp_error)?
            .map(|_| true);
        let closed = page
            .event_listener::<EventJavascriptDialogClosed>()
            .await
            .map_err(cdp_error)?
            .map(|_| false);
        let mut events = futures::stream::select(opened, closed);
        Ok(tokio::spawn(async move {
            while let Some(open) = events.next().await {
                flag.store(open, Ordering::SeqCst);
            }
        }))
    }

    /// Close the browser
    pub fn close(mut self) -> HarnessResult<()> {
        let _ = self
            .runtime
            .block_on(self.browser.close())
            .map_err(cdp_error)?;
        Ok(())
    }

    fn evaluate<T: DeserializeOwned>(&self, expression: String) -> HarnessResult<Option<T>> {
        let result = self
            .runtime
            .block_on(self.page.evaluate(expression))
            .map_err(|e| HarnessError::Script {
                message: e.to_string(),
            })?;
        result
            .value()
            .filter(|v| !v.is_null())
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(HarnessError::from)
    }

    /// Evaluate `body` with `el` bound to the handle's node
    fn on_node<T: DeserializeOwned>(&self, handle: &ElementHandle, body: &str) -> HarnessResult<T> {
        let expression = format!(
            "(() => {{ const el = {}; if (!el || !el.isConnected) return {{ stale: true }}; \
             return {{ value: ({body}) }}; }})()",
            node_ref(handle)
        );
        let reply: Reply<T> = self
            .evaluate(expression)?
            .ok_or_else(|| HarnessError::driver("empty reply from page"))?;
        if reply.stale {
            return Err(HarnessError::StaleReference {
                locator: handle.locator().clone(),
            });
        }
        reply
            .value
            .ok_or_else(|| HarnessError::driver("page returned no value"))
    }

    fn interactable_point(&self, handle: &ElementHandle) -> HarnessResult<Point> {
        let target: Target = self.on_node(handle, INTERACTABLE)?;
        if let Some(reason) = target.reason {
            return Err(HarnessError::NotInteractable {
                locator: handle.locator().clone(),
                reason,
            });
        }
        Ok(Point::new(target.x, target.y))
    }
}

impl Drop for CdpSession {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

fn node_ref(handle: &ElementHandle) -> String {
    format!(
        "(window.__pageflow && window.__pageflow.nodes.get({}))",
        js_string(handle.id())
    )
}

/// Body run with `el` bound to an option: select it and notify its dropdown
fn select_option_body(select: &ElementHandle) -> String {
    format!(
        "(() => {{ const sel = {}; \
         if (!sel || el.closest('select') !== sel) return false; \
         el.selected = true; \
         sel.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         sel.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         return true; }})()",
        node_ref(select)
    )
}

/// Run `query` below `scope_expr` and register the matches
fn find_script(scope_expr: &str, query: &str) -> String {
    format!(
        "(() => {{ const scope = {scope_expr}; \
         if (!scope || (scope !== document && !scope.isConnected)) return {{ stale: true }}; \
         const reg = {REGISTRY}; \
         for (const [id, node] of reg.nodes) {{ if (!node.isConnected) reg.nodes.delete(id); }} \
         return {{ value: {query}.map(el => {{ \
           let id = reg.ids.get(el); \
           if (!id || !reg.nodes.has(id)) {{ \
             id = reg.prefix + ':' + (++reg.seq); reg.nodes.set(id, el); reg.ids.set(el, id); \
           }} \
           return id; }}) }}; }})()"
    )
}

fn cdp_error(err: chromiumoxide::error::CdpError) -> HarnessError {
    HarnessError::driver(err.to_string())
}

impl Session for CdpSession {
    fn find_elements(
        &self,
        scope: Option<&ElementHandle>,
        locator: &Locator,
    ) -> HarnessResult<Vec<ElementHandle>> {
        let scope_expr = scope.map_or_else(|| "document".to_string(), node_ref);
        let expression = find_script(&scope_expr, &locator.to_query_all("scope"));
        let reply: Reply<Vec<String>> = self
            .evaluate(expression)?
            .ok_or_else(|| HarnessError::driver("empty reply from page"))?;
        if reply.stale {
            let stale = scope.map_or(locator, ElementHandle::locator);
            return Err(HarnessError::StaleReference {
                locator: stale.clone(),
            });
        }
        let ids = reply.value.unwrap_or_default();
        debug!(locator = %locator, matches = ids.len(), "find");
        Ok(ids
            .into_iter()
            .map(|id| ElementHandle::new(id, locator.clone()))
            .collect())
    }

    fn is_displayed(&self, handle: &ElementHandle) -> HarnessResult<bool> {
        self.on_node(
            handle,
            "(() => { const s = getComputedStyle(el); return s.display !== 'none' && \
             s.visibility !== 'hidden' && s.opacity !== '0' && el.getClientRects().length > 0; })()",
        )
    }

    fn is_enabled(&self, handle: &ElementHandle) -> HarnessResult<bool> {
        self.on_node(handle, "!el.disabled")
    }

    fn is_selected(&self, handle: &ElementHandle) -> HarnessResult<bool> {
        self.on_node(handle, "!!(el.checked || el.selected)")
    }

    fn bounding_box(&self, handle: &ElementHandle) -> HarnessResult<BoundingBox> {
        self.on_node(
            handle,
            "(() => { const r = el.getBoundingClientRect(); \
             return { x: r.x, y: r.y, width: r.width, height: r.height }; })()",
        )
    }

    fn text(&self, handle: &ElementHandle) -> HarnessResult<String> {
        self.on_node(handle, "el.innerText || ''")
    }

    fn tag_name(&self, handle: &ElementHandle) -> HarnessResult<String> {
        self.on_node(handle, "el.tagName.toLowerCase()")
    }

    fn click(&self, handle: &ElementHandle) -> HarnessResult<()> {
        let point = self.interactable_point(handle)?;
        let _ = self
            .runtime
            .block_on(self.page.click(point))
            .map_err(cdp_error)?;
        Ok(())
    }

    fn select_option(&self, select: &ElementHandle, option: &ElementHandle) -> HarnessResult<()> {
        if !self.is_enabled(select)? {
            return Err(HarnessError::NotInteractable {
                locator: select.locator().clone(),
                reason: "dropdown is disabled".to_string(),
            });
        }
        let chosen: bool = self.on_node(option, &select_option_body(select))?;
        if !chosen {
            return Err(HarnessError::driver(format!(
                "{} is not an option of {}",
                option.locator(),
                select.locator()
            )));
        }
        debug!(select = %select.locator(), "option selected");
        Ok(())
    }

    fn send_keys(&self, handle: &ElementHandle, text: &str) -> HarnessResult<()> {
        let _ = self.interactable_point(handle)?;
        let _: bool = self.on_node(
            handle,
            "(() => { el.focus(); if (typeof el.setSelectionRange === 'function') \
             { const n = el.value.length; el.setSelectionRange(n, n); } return true; })()",
        )?;
        let _ = self
            .runtime
            .block_on(self.page.execute(InsertTextParams::new(text)))
            .map_err(cdp_error)?;
        Ok(())
    }

    fn clear(&self, handle: &ElementHandle) -> HarnessResult<()> {
        let _ = self.interactable_point(handle)?;
        let _: bool = self.on_node(
            handle,
            "(() => { el.value = ''; \
             el.dispatchEvent(new Event('input', { bubbles: true })); \
             el.dispatchEvent(new Event('change', { bubbles: true })); return true; })()",
        )?;
        Ok(())
    }

    fn execute_script(
        &self,
        script: &str,
        args: &[ScriptArg],
    ) -> HarnessResult<serde_json::Value> {
        let mut bound = Vec::with_capacity(args.len());
        let mut guards = Vec::new();
        for (i, arg) in args.iter().enumerate() {
            match arg {
                ScriptArg::Element(handle) => {
                    bound.push(node_ref(handle));
                    guards.push(format!(
                        "if (!args[{i}] || !args[{i}].isConnected) return {{ stale: {i} }};"
                    ));
                }
                ScriptArg::Value(value) => bound.push(value.to_string()),
            }
        }
        let expression = format!(
            "(() => {{ const args = [{}]; {} \
             const out = (function() {{ {script} }}).apply(null, args); \
             return {{ value: out instanceof Node ? null : (out === undefined ? null : out) }}; }})()",
            bound.join(", "),
            guards.join(" ")
        );

        #[derive(Deserialize)]
        struct ScriptReply {
            stale: Option<usize>,
            value: Option<serde_json::Value>,
        }

        let reply: ScriptReply = self
            .evaluate(expression)?
            .ok_or_else(|| HarnessError::driver("empty reply from page"))?;
        if let Some(index) = reply.stale {
            let locator = match args.get(index) {
                Some(ScriptArg::Element(handle)) => handle.locator().clone(),
                _ => return Err(HarnessError::driver("stale non-element argument")),
            };
            return Err(HarnessError::StaleReference { locator });
        }
        Ok(reply.value.unwrap_or(serde_json::Value::Null))
    }

    fn move_to(&self, handle: &ElementHandle) -> HarnessResult<()> {
        let target: Target = self.on_node(
            handle,
            "(() => { el.scrollIntoView({ block: 'center', inline: 'center' }); \
             const r = el.getBoundingClientRect(); \
             return { x: r.left + r.width / 2, y: r.top + r.height / 2 }; })()",
        )?;
        let _ = self
            .runtime
            .block_on(self.page.move_mouse(Point::new(target.x, target.y)))
            .map_err(cdp_error)?;
        Ok(())
    }

    fn is_alert_present(&self) -> HarnessResult<bool> {
        Ok(self.dialog_open.load(Ordering::SeqCst))
    }

    fn current_url(&self) -> HarnessResult<String> {
        let url = self
            .runtime
            .block_on(self.page.url())
            .map_err(cdp_error)?;
        Ok(url.unwrap_or_default())
    }

    fn navigate(&self, url: &str) -> HarnessResult<()> {
        let _ = self
            .runtime
            .block_on(self.page.goto(url))
            .map_err(|e| HarnessError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        info!(url, "navigated");
        Ok(())
    }
}
