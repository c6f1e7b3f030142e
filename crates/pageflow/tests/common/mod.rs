//! Scripted model of the admin application on a `MockSession`.
//!
//! Screens are groups of nodes attached and detached by click reactions.
//! A few controls become ready only after a delay on the shared fake clock,
//! so the waits in page transitions have something to wait for.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use pageflow::prelude::*;

pub const LOGIN_URL: &str = "https://groceryapp.uniqassosiates.com/admin/login";

pub struct AdminApp {
    pub session: MockSession,
    pub clock: Arc<FakeClock>,
    pub login: Vec<NodeId>,
    pub home: Vec<NodeId>,
    pub admin_list: Vec<NodeId>,
    pub admin_form: Vec<NodeId>,
    pub news_list: Vec<NodeId>,
    pub news_form: Vec<NodeId>,
    pub search_panel: Vec<NodeId>,
    pub username: NodeId,
    pub admin_username: NodeId,
    pub admin_option: NodeId,
    pub news_area: NodeId,
    pub search_field: NodeId,
    pub admin_alert: NodeId,
    pub news_alert: NodeId,
    pub admin_button: NodeId,
}

fn attach(ids: &[NodeId]) -> Reaction {
    Reaction::Apply(ids.to_vec(), NodeChange::Attached(true))
}

fn detach(ids: &[NodeId]) -> Reaction {
    Reaction::Apply(ids.to_vec(), NodeChange::Attached(false))
}

impl AdminApp {
    /// Build the application showing the sign-in form
    pub fn new() -> Self {
        let clock = Arc::new(FakeClock::new());
        let session = MockSession::with_clock(clock.clone());
        let s = &session;

        let login_l = LoginLocators::default();
        let home_l = HomeLocators::default();
        let admin_l = AdminLocators::default();
        let news_l = NewsLocators::default();

        // Sign-in form
        let username = s.add(MockNode::new("input"), &[login_l.username.clone()]);
        let password = s.add(MockNode::new("input"), &[login_l.password.clone()]);
        let sign_in = s.add(MockNode::new("button"), &[login_l.sign_in.clone()]);
        let login = vec![username, password, sign_in];

        // Dashboard; the header menu renders late
        let admin_button = s.add(
            MockNode::new("a").hidden().detached(),
            &[home_l.admin_button.clone()],
        );
        let log_out = s.add(
            MockNode::new("i").detached(),
            &[home_l.log_out.clone(), home_l.ready.clone()],
        );
        let admin_info = s.add(MockNode::new("a").detached(), &[home_l.admin_info.clone()]);
        let manage_news = s.add(MockNode::new("a").detached(), &[home_l.manage_news.clone()]);
        let home = vec![admin_button, log_out, admin_info, manage_news];

        // Admin users list and create form
        let new_admin = s.add(
            MockNode::new("a").disabled().detached(),
            &[admin_l.new_admin.clone()],
        );
        let admin_list = vec![new_admin];
        let admin_username = s.add(MockNode::new("input").detached(), &[admin_l.username.clone()]);
        let admin_password = s.add(MockNode::new("input").detached(), &[admin_l.password.clone()]);
        let user_type = s.add(MockNode::new("select").detached(), &[admin_l.user_type.clone()]);
        let option = Locator::css("option");
        let _ = s.add_child(
            user_type,
            MockNode::new("option").with_text("Select").selected(true),
            &[option.clone()],
        );
        let _ = s.add_child(user_type, MockNode::new("option").with_text("Staff"), &[option.clone()]);
        let admin_option = s.add_child(user_type, MockNode::new("option").with_text("Admin"), &[option]);
        let admin_save = s.add(MockNode::new("button").detached(), &[admin_l.save.clone()]);
        let admin_form = vec![admin_username, admin_password, user_type, admin_save];
        let admin_alert = s.add(MockNode::new("div").detached(), &[admin_l.alert.clone()]);

        // News list, create form and search panel
        let new_news = s.add(MockNode::new("a").detached(), &[news_l.new_news.clone()]);
        let search_button = s.add(MockNode::new("a").detached(), &[news_l.search_button.clone()]);
        let home_link = s.add(
            MockNode::new("a").with_text("Home").detached(),
            &[news_l.home.clone()],
        );
        let reset = s.add(MockNode::new("a").detached(), &[news_l.reset.clone()]);
        let news_list = vec![new_news, search_button, home_link, reset];
        let news_area = s.add(MockNode::new("textarea").detached(), &[news_l.news_text.clone()]);
        let news_save = s.add(MockNode::new("button").detached(), &[news_l.save.clone()]);
        let news_form = vec![news_area, news_save];
        let search_field = s.add(MockNode::new("input").detached(), &[news_l.search_field.clone()]);
        let search_news = s.add(MockNode::new("button").detached(), &[news_l.search_news.clone()]);
        let search_panel = vec![search_field, search_news];
        let news_alert = s.add(MockNode::new("div").detached(), &[news_l.alert.clone()]);

        let everything_but_login: Vec<NodeId> = home
            .iter()
            .chain(&admin_list)
            .chain(&admin_form)
            .chain(&news_list)
            .chain(&news_form)
            .chain(&search_panel)
            .chain([&admin_alert, &news_alert])
            .copied()
            .collect();

        s.on_click(sign_in, detach(&login));
        s.on_click(sign_in, attach(&home));
        s.on_click(
            sign_in,
            Reaction::After(
                Duration::from_millis(200),
                vec![admin_button],
                NodeChange::Displayed(true),
            ),
        );
        s.on_click(sign_in, Reaction::Navigate("https://groceryapp.uniqassosiates.com/admin".into()));

        for entry in [admin_button, admin_info] {
            s.on_click(entry, detach(&home));
            s.on_click(entry, attach(&admin_list));
            s.on_click(
                entry,
                Reaction::After(
                    Duration::from_millis(100),
                    vec![new_admin],
                    NodeChange::Enabled(true),
                ),
            );
        }
        s.on_click(new_admin, attach(&admin_form));
        s.on_click(admin_save, attach(&[admin_alert]));

        s.on_click(manage_news, detach(&home));
        s.on_click(manage_news, attach(&news_list));
        s.on_click(new_news, attach(&news_form));
        s.on_click(news_save, attach(&[news_alert]));
        s.on_click(search_button, attach(&search_panel));
        s.on_click(reset, detach(&news_form));
        s.on_click(reset, detach(&search_panel));
        s.on_click(reset, detach(&[news_alert]));
        s.on_click(home_link, detach(&news_list));
        s.on_click(home_link, detach(&news_form));
        s.on_click(home_link, detach(&search_panel));
        s.on_click(home_link, detach(&[news_alert]));
        s.on_click(home_link, attach(&home));

        s.on_click(log_out, detach(&everything_but_login));
        s.on_click(log_out, attach(&login));
        s.on_click(log_out, Reaction::Navigate(LOGIN_URL.into()));

        s.on_navigate(LOGIN_URL, detach(&everything_but_login));
        s.on_navigate(LOGIN_URL, attach(&login));

        Self {
            session,
            clock,
            login,
            home,
            admin_list,
            admin_form,
            news_list,
            news_form,
            search_panel,
            username,
            admin_username,
            admin_option,
            news_area,
            search_field,
            admin_alert,
            news_alert,
            admin_button,
        }
    }

    /// Page context on the app's session and fake clock
    pub fn context(&self) -> PageContext<'_> {
        PageContext::new(
            &self.session,
            Waiter::new().with_clock(self.clock.clone()),
            Fixtures::default(),
        )
    }

    pub fn login_page(&self) -> LoginPage<'_> {
        LoginPage::new(self.context())
    }
}
