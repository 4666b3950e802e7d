use std::sync::Arc;
use std::time::Duration;
use ratatui::widgets::{ListState, TableState};
use tokio::task::JoinHandle;
use crg_core::{
    ChatContext, ChatGateway, ChatReply, CoinGeckoClient, Completion, Config, Conversation,
    CountrySelector, GatewayError, GeminiClient, MarketEvent, MarketGateway, MarketPoller,
    MarketWidget, SendRejected,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Global,
    Country,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

type ChatTask = JoinHandle<Result<ChatReply, GatewayError>>;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub tab: Tab,
    pub selected_country: Option<String>,
    pub input_mode: InputMode,

    // Chat state
    pub conversation: Conversation,
    pub chat_input: String,
    pub chat_cursor: usize, // cursor position in chat_input (chars)
    pub chat_scroll: u16,
    pub follow_chat: bool,  // keep the newest message in view
    pub chat_task: Option<(u64, ChatTask)>,

    // Country selector state
    pub selector: CountrySelector,

    // Market popup state
    pub market: MarketWidget,
    pub market_poller: Option<MarketPoller>,
    pub market_table_state: TableState,
    pub market_search_editing: bool,
    pub refresh_interval: Duration,

    // Sidebar
    pub sidebar_state: ListState,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Gateways
    pub chat_gateway: Arc<dyn ChatGateway>,
    pub market_gateway: Arc<dyn MarketGateway>,
    pub model_name: String,
    pub missing_api_key: bool,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let chat = GeminiClient::new(config.chat_endpoint(), config.model(), config.api_key());
        let missing_api_key = !chat.has_api_key();
        if missing_api_key {
            tracing::warn!("no Gemini API key configured; chat requests will fail");
        }
        let market = CoinGeckoClient::new(config.market_endpoint());

        let mut app = Self::with_gateways(Arc::new(chat), Arc::new(market), config.refresh_interval());
        app.model_name = config.model().to_string();
        app.missing_api_key = missing_api_key;
        app
    }

    pub fn with_gateways(
        chat_gateway: Arc<dyn ChatGateway>,
        market_gateway: Arc<dyn MarketGateway>,
        refresh_interval: Duration,
    ) -> Self {
        let mut sidebar_state = ListState::default();
        sidebar_state.select(Some(0));

        Self {
            should_quit: false,
            tab: Tab::Global,
            selected_country: None,
            input_mode: InputMode::Normal,

            conversation: Conversation::new(ChatContext::Global),
            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            follow_chat: true,
            chat_task: None,

            selector: CountrySelector::new(),

            market: MarketWidget::new(),
            market_poller: None,
            market_table_state: TableState::default(),
            market_search_editing: false,
            refresh_interval,

            sidebar_state,

            animation_frame: 0,

            chat_gateway,
            market_gateway,
            model_name: String::new(),
            missing_api_key: false,
        }
    }

    /// True while the country tab is waiting for a jurisdiction.
    pub fn showing_selector(&self) -> bool {
        self.tab == Tab::Country && self.selected_country.is_none()
    }

    fn sync_context(&mut self) {
        let context = match self.tab {
            Tab::Global => ChatContext::Global,
            Tab::Country => ChatContext::Country(self.selected_country.clone()),
        };
        if self.conversation.set_context(context) {
            self.chat_scroll = 0;
            self.follow_chat = true;
        }
        self.sidebar_state.select(Some(match self.tab {
            Tab::Global => 0,
            Tab::Country => 1,
        }));
    }

    pub fn navigate(&mut self, tab: Tab) {
        self.tab = tab;
        if tab == Tab::Global {
            self.selected_country = None;
        }
        self.sync_context();
        self.input_mode = if self.showing_selector() {
            InputMode::Editing
        } else {
            InputMode::Normal
        };
    }

    pub fn select_country(&mut self, country: String) {
        self.selected_country = Some(country);
        self.selector.clear();
        self.sync_context();
        self.input_mode = InputMode::Normal;
    }

    /// Drop the jurisdiction but stay on the country tab, back at the selector.
    pub fn clear_country(&mut self) {
        self.selected_country = None;
        self.sync_context();
        self.input_mode = InputMode::Editing;
    }

    pub fn confirm_selector(&mut self) {
        if let Some(country) = self.selector.confirm() {
            self.select_country(country);
        }
    }

    /// Submit the input line. Ignored while a reply is pending.
    pub fn submit_chat(&mut self) {
        let text = self.chat_input.clone();
        match self.conversation.begin_send(&text) {
            Ok(request) => {
                self.chat_input.clear();
                self.chat_cursor = 0;
                self.follow_chat = true;

                let gateway = self.chat_gateway.clone();
                let generation = request.generation;
                let task = tokio::spawn(async move { gateway.send(&request).await });
                self.chat_task = Some((generation, task));
            }
            Err(SendRejected::Empty) => {}
            Err(rejected) => tracing::debug!("send rejected: {}", rejected),
        }
    }

    /// Feed a finished chat task back into the conversation.
    pub async fn poll_chat_task(&mut self) {
        let finished = matches!(&self.chat_task, Some((_, task)) if task.is_finished());
        if !finished {
            return;
        }
        if let Some((generation, task)) = self.chat_task.take() {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(GatewayError::Internal(e.to_string())),
            };
            if self.conversation.complete(generation, result) == Completion::Applied {
                self.follow_chat = true;
            }
        }
    }

    pub fn open_market(&mut self) {
        if self.market.open() {
            self.market_poller = Some(MarketPoller::start(self.market_gateway.clone(), self.refresh_interval));
            self.market_table_state.select(Some(0));
        }
    }

    pub fn close_market(&mut self) {
        self.market.close();
        self.market_search_editing = false;
        // Dropping the poller cancels the refresh timer
        self.market_poller = None;
    }

    pub fn refresh_market(&mut self) {
        if !self.market.can_refresh() {
            return;
        }
        if let Some(poller) = &self.market_poller {
            poller.refresh();
        }
    }

    pub fn drain_market_events(&mut self) {
        let Some(poller) = self.market_poller.as_mut() else {
            return;
        };
        while let Some(event) = poller.try_next() {
            match event {
                MarketEvent::FetchStarted => self.market.fetch_started(),
                MarketEvent::FetchFinished(result) => {
                    self.market.fetch_finished(result);
                }
            }
        }
        self.clamp_market_selection();
    }

    pub fn clamp_market_selection(&mut self) {
        let len = self.market.visible_coins().len();
        let selected = self.market_table_state.selected().unwrap_or(0);
        if len == 0 {
            self.market_table_state.select(None);
        } else {
            self.market_table_state.select(Some(selected.min(len - 1)));
        }
    }

    pub fn market_nav_down(&mut self) {
        let len = self.market.visible_coins().len();
        if len == 0 {
            return;
        }
        let i = self.market_table_state.selected().map_or(0, |i| (i + 1).min(len - 1));
        self.market_table_state.select(Some(i));
    }

    pub fn market_nav_up(&mut self) {
        let i = self.market_table_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.market_table_state.select(Some(i));
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.follow_chat = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_loading() || self.market.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
