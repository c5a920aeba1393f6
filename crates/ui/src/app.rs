use std::path::PathBuf;
use std::time::Duration;

use eframe::egui::{self, Color32, RichText};

use crate::state::{ActiveTab, AppState, NoticeKind, StyleChoice, WorkflowPhase};
use crate::tasks::{TaskCommand, TaskController, TaskEvent};
use rewriter_core::export::ExportFormat;
use rewriter_core::logging::{LogLevel, LogRecord, VecLogSink};
use rewriter_core::rewrite::SUCCESS_MESSAGE;

const DEFAULT_CONFIG_PATH: &str = "config.json";

pub struct RewriterApp {
    state: AppState,
    tasks: TaskController,
    status_message: Option<String>,
}

impl RewriterApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config_path: Option<PathBuf>) -> Self {
        let path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let (mut state, problems) = AppState::new_or_default(path);
        let mut status_message = None;
        for problem in problems {
            let message = format!("Failed to load settings: {problem}. Using defaults.");
            state.push_log(LogRecord::error(message.clone()));
            status_message = Some(message);
        }

        Self {
            state,
            tasks: TaskController::new(),
            status_message,
        }
    }

    fn handle_event(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::Log(record) => self.state.push_log(record),
            TaskEvent::TaskStarted(kind) => {
                self.state.active_task = Some(kind);
            }
            TaskEvent::RewriteFinished(result) => {
                self.state.active_task = None;
                self.state
                    .apply_rewrite_result(result.map_err(|err| err.into_rewrite_error()));
            }
            TaskEvent::ConnectionTested(result) => {
                self.state.active_task = None;
                self.state
                    .apply_test_result(result.map_err(|err| err.into_rewrite_error()));
            }
        }
    }

    fn save_config(&mut self) {
        match self.state.persist_config() {
            Ok(()) => self.status_message = Some("Settings saved".to_string()),
            Err(err) => self.status_message = Some(format!("Failed to save settings: {err}")),
        }
    }

    fn reload_config(&mut self) {
        let trimmed = self.state.config_path_input.trim();
        if trimmed.is_empty() {
            self.status_message = Some("Enter a config file path first".to_string());
            return;
        }
        let path = PathBuf::from(trimmed);
        match self.state.reload_from_path(path.clone()) {
            Ok(()) => self.status_message = Some(format!("Reloaded {}", path.display())),
            Err(err) => self.status_message = Some(format!("Failed to load settings: {err}")),
        }
    }

    fn dispatch_command(&mut self, command: TaskCommand) {
        let kind = command.kind();
        match self.tasks.send(command) {
            // Marked busy right away so a second click in the same frame
            // cannot queue another request.
            Ok(()) => self.state.active_task = Some(kind),
            Err(err) => self.status_message = Some(format!("Failed to start task: {err}")),
        }
    }

    fn start_rewrite(&mut self) {
        if let Err(err) = self.state.sync_form_state() {
            self.status_message = Some(format!("Invalid settings: {err}"));
            return;
        }
        let sink = VecLogSink::new();
        let command = self.state.make_rewrite_command(&sink);
        for record in sink.records() {
            self.state.push_log(record);
        }
        match command {
            Ok(command) => {
                self.state.notice = None;
                self.dispatch_command(TaskCommand::Rewrite(command));
            }
            Err(err) => self.state.reject_rewrite(&err),
        }
    }

    fn start_connection_test(&mut self) {
        match self.state.make_test_command() {
            Ok(command) => {
                self.state.settings_status = None;
                self.dispatch_command(TaskCommand::TestConnection(command));
            }
            Err(err) => self.status_message = Some(format!("Invalid settings: {err}")),
        }
    }

    fn export(&mut self, format: ExportFormat) {
        let picked = rfd::FileDialog::new()
            .set_file_name(self.state.default_export_name(format))
            .add_filter(format.label(), &[format.extension()])
            .save_file();
        if let Some(path) = picked {
            if self.state.export_to(format, &path).is_ok() {
                self.status_message = Some(format!("Exported to {}", path.display()));
            }
        }
    }

    fn show_rewrite_tab(&mut self, ui: &mut egui::Ui) {
        let busy = self.state.is_busy();

        ui.label(RichText::new("Write your messy draft here").strong());
        self.state.draft.ui(ui, "draft_editor", 10, !busy);
        ui.small(self.state.draft.counter_label());

        ui.add_space(6.0);
        ui.label(RichText::new("Choose a rewrite style").strong());
        ui.add_enabled_ui(!busy, |ui| {
            ui.horizontal(|ui| {
                for choice in StyleChoice::ALL {
                    ui.radio_value(&mut self.state.style, choice, choice.label());
                }
            });
        });
        if self.state.style == StyleChoice::Custom {
            self.state.custom_prompt.ui(ui, "custom_prompt_editor", 3, !busy);
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!busy, egui::Button::new("Rewrite into polished paragraph"))
                .clicked()
            {
                self.start_rewrite();
            }
            if let Some(task) = self.state.active_task {
                ui.spinner();
                ui.label(task.label());
            }
        });

        if let Some(notice) = &self.state.notice {
            let color = match notice.kind {
                NoticeKind::Success => Color32::LIGHT_GREEN,
                NoticeKind::Warning => Color32::YELLOW,
                NoticeKind::Error => Color32::RED,
            };
            ui.colored_label(color, notice.message.as_str());
        }

        if self.state.phase() == WorkflowPhase::ResultReady {
            self.show_result_section(ui, busy);
        }

        if !self.state.session().entries().is_empty() {
            ui.separator();
            self.show_saved_entries(ui, busy);
        }
    }

    fn show_result_section(&mut self, ui: &mut egui::Ui, busy: bool) {
        ui.separator();
        ui.colored_label(Color32::LIGHT_GREEN, SUCCESS_MESSAGE);
        if let Some(latest) = self.state.session().latest() {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.label(latest);
            });
        }

        ui.add_space(6.0);
        ui.horizontal(|ui| {
            ui.label("Title");
            ui.text_edit_singleline(&mut self.state.save_form.title);
        });
        ui.horizontal(|ui| {
            ui.label("Keywords (comma-separated)");
            ui.text_edit_singleline(&mut self.state.save_form.keywords);
        });
        if ui
            .add_enabled(!busy, egui::Button::new("Save this paragraph"))
            .clicked()
        {
            self.state.save_latest();
        }
    }

    fn show_saved_entries(&mut self, ui: &mut egui::Ui, busy: bool) {
        ui.heading("Saved Paragraphs");
        for (index, entry) in self.state.session().entries().iter().enumerate() {
            ui.label(RichText::new(format!("{}. {}", index + 1, entry.title())).strong());
            ui.label(RichText::new(format!("Keywords: {}", entry.keywords())).italics());
            ui.label(entry.paragraph());
            ui.add_space(4.0);
        }

        ui.horizontal(|ui| {
            for format in ExportFormat::ALL {
                let caption = format!("Download all as {}", format.label());
                if ui.add_enabled(!busy, egui::Button::new(caption)).clicked() {
                    self.export(format);
                }
            }
        });
    }

    fn show_settings_tab(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Config file");
            let response = ui.text_edit_singleline(&mut self.state.config_path_input);
            if response.changed() {
                self.status_message = None;
            }
            if ui.button("Browse...").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("JSON", &["json"])
                    .pick_file()
                {
                    self.state.config_path_input = path.display().to_string();
                }
            }
            if ui.button("Reload").clicked() {
                self.reload_config();
            }
            if ui.button("Save").clicked() {
                self.save_config();
            }
        });

        ui.separator();
        ui.heading("Language model");
        let form = &mut self.state.settings;
        ui.horizontal(|ui| {
            ui.label("API key");
            ui.add(egui::TextEdit::singleline(&mut form.api_key).password(true));
        });
        ui.small("Leave blank to use the OPENAI_API_KEY environment variable.");
        ui.horizontal(|ui| {
            ui.label("Base URL");
            ui.text_edit_singleline(&mut form.base_url);
        });
        ui.horizontal(|ui| {
            ui.label("Model");
            ui.text_edit_singleline(&mut form.model_name);
        });
        ui.horizontal(|ui| {
            ui.label("Temperature");
            ui.text_edit_singleline(&mut form.temperature);
            ui.label("Timeout (s)");
            ui.text_edit_singleline(&mut form.timeout);
        });

        ui.separator();
        let busy = self.state.is_busy();
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!busy, egui::Button::new("Test connection"))
                .clicked()
            {
                self.start_connection_test();
            }
            if ui.button("Reload prompts").clicked() {
                self.status_message = Some(match self.state.reload_prompts() {
                    Ok(()) => "Prompts reloaded".to_string(),
                    Err(err) => format!("Failed to load prompts: {err}"),
                });
            }
        });
        if let Some(status) = &self.state.settings_status {
            let color = match status.kind {
                NoticeKind::Success => Color32::LIGHT_GREEN,
                NoticeKind::Warning => Color32::YELLOW,
                NoticeKind::Error => Color32::RED,
            };
            ui.colored_label(color, status.message.as_str());
        }
    }

    fn show_logs_tab(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Clear").clicked() {
                self.state.clear_logs();
            }
            if let Some(task) = self.state.active_task {
                ui.label(task.label());
            }
        });
        egui::ScrollArea::vertical()
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for record in self.state.logs.iter() {
                    let color = match record.level {
                        LogLevel::Error => Color32::RED,
                        LogLevel::Warn => Color32::YELLOW,
                        LogLevel::Info => Color32::LIGHT_GREEN,
                        LogLevel::Debug => Color32::LIGHT_BLUE,
                    };
                    ui.colored_label(color, format!("[{}] {}", record.level, record.message));
                }
            });
    }
}

impl eframe::App for RewriterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Some(event) = self.tasks.try_recv() {
            self.handle_event(event);
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Non-Fiction Paragraph Rewriter");
                if let Some(status) = &self.status_message {
                    ui.colored_label(Color32::LIGHT_BLUE, status);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tab in ActiveTab::ALL {
                    let selected = self.state.active_tab == tab;
                    if ui.selectable_label(selected, tab.label()).clicked() {
                        self.state.active_tab = tab;
                    }
                }
            });
            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| match self.state.active_tab {
                ActiveTab::Rewrite => self.show_rewrite_tab(ui),
                ActiveTab::Settings => self.show_settings_tab(ui),
                ActiveTab::Logs => self.show_logs_tab(ui),
            });
        });

        if self.state.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
