use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use iced::widget::{button, column, container, row, scrollable, text, text_input};
use iced::{event, window, Alignment, Element, Event, Length, Subscription, Task, Theme};

use facelens_core::capture::infrastructure::ffmpeg_camera::FfmpegCameraProvider;
use facelens_core::capture::infrastructure::threaded_camera::ThreadedCameraProvider;
use facelens_core::pipeline::known_faces_use_case::KnownFacesUseCase;
use facelens_core::pipeline::live_frame_annotator::{
    AnnotatorConfig, LiveFrameAnnotator, StartOutcome, TickOutcome,
};
use facelens_core::pipeline::recognize_image_use_case::{
    RecognitionSummary, RecognizeImageUseCase,
};
use facelens_core::pipeline::request_dispatcher::ThreadRequestDispatcher;
use facelens_core::recognition::infrastructure::http_face_service::HttpFaceServiceClient;
use facelens_core::shared::client_config::ClientConfig;
use facelens_core::shared::constants::IMAGE_EXTENSIONS;
use facelens_core::shared::encoded_image::is_supported_image;
use facelens_core::shared::error::ClientError;
use facelens_core::ui::known_faces_list::{KnownFaceAction, KnownFacesList};
use facelens_core::ui::notifications::{Notice, Severity, ToastQueue};

use crate::tabs::add_face_tab::{self, AddFaceState};
use crate::tabs::known_faces_tab;
use crate::tabs::recognize_tab::{self, RecognizeState};
use crate::tabs::webcam_tab::{self, WebcamState};
use crate::theme;
use crate::workers::requests::run_blocking;

const TOAST_POLL_INTERVAL: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// Tab enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Recognize,
    AddFace,
    Webcam,
    KnownFaces,
}

impl Tab {
    const ALL: &[Tab] = &[Tab::Recognize, Tab::AddFace, Tab::Webcam, Tab::KnownFaces];

    fn label(self) -> &'static str {
        match self {
            Tab::Recognize => "Recognize",
            Tab::AddFace => "Add Face",
            Tab::Webcam => "Webcam",
            Tab::KnownFaces => "Known Faces",
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    TabSelected(Tab),
    ServerUrlChanged(String),
    ApplyServerUrl,
    HealthChecked(Result<String, ClientError>),
    FileDropped(PathBuf),
    PickRecognizeImage,
    RecognizeImagePicked(Option<PathBuf>),
    Recognize,
    RecognizeFinished(Result<RecognitionSummary, ClientError>),
    AddNameChanged(String),
    PickAddImage,
    AddImagePicked(Option<PathBuf>),
    AddFace,
    AddFaceFinished(Result<Notice, ClientError>),
    RefreshKnownFaces,
    KnownFacesLoaded(Result<KnownFacesList, ClientError>),
    KnownFace(KnownFaceAction),
    DeleteFinished(String, Result<Notice, ClientError>),
    StartWebcam,
    StopWebcam,
    WebcamTick,
    ExpireToasts,
    DismissToast(u64),
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    active_tab: Tab,
    theme: Theme,
    config: ClientConfig,
    server_url_input: String,
    server_status: String,
    service: Result<Arc<HttpFaceServiceClient>, ClientError>,
    toasts: ToastQueue,
    recognize: RecognizeState,
    add_face: AddFaceState,
    known_faces: KnownFacesList,
    known_faces_loading: bool,
    webcam: WebcamState,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let mut toasts = ToastQueue::new();
        let config = ClientConfig::load().unwrap_or_else(|e| {
            log::warn!("Falling back to default settings: {e}");
            toasts.push(Notice::error(format!("Error: {e}")), Instant::now());
            ClientConfig::default()
        });
        let service = connect(&config);

        let mut app = Self {
            active_tab: Tab::Recognize,
            theme: theme::resolve_theme(),
            server_url_input: config.server_url.clone(),
            server_status: "Checking\u{2026}".to_string(),
            config,
            service,
            toasts,
            recognize: RecognizeState::default(),
            add_face: AddFaceState::default(),
            known_faces: KnownFacesList::default(),
            known_faces_loading: false,
            webcam: WebcamState::new(),
        };
        let startup = Task::batch([app.check_health(), app.refresh_known_faces()]);
        (app, startup)
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::TabSelected(tab) => {
                self.active_tab = tab;
            }
            Message::ServerUrlChanged(url) => {
                self.server_url_input = url;
            }
            Message::ApplyServerUrl => return self.apply_server_url(),
            Message::HealthChecked(Ok(status)) => {
                self.server_status = format!("Connected ({status})");
            }
            Message::HealthChecked(Err(e)) => {
                log::warn!("Health check failed: {e}");
                self.server_status = "Unreachable".to_string();
            }
            Message::FileDropped(path) => self.accept_dropped_file(path),
            Message::PickRecognizeImage => {
                return Task::perform(pick_image("Select an image"), Message::RecognizeImagePicked);
            }
            Message::RecognizeImagePicked(Some(path)) => {
                self.recognize.path = Some(path);
                self.recognize.summary = None;
            }
            Message::RecognizeImagePicked(None) => {}
            Message::Recognize => return self.recognize_image(),
            Message::RecognizeFinished(result) => {
                self.recognize.busy = false;
                match result {
                    Ok(summary) => {
                        self.notify(summary.notice());
                        self.recognize.summary = Some(summary);
                    }
                    Err(e) => {
                        self.recognize.summary = None;
                        self.fail(&e);
                    }
                }
            }
            Message::AddNameChanged(name) => {
                self.add_face.name = name;
            }
            Message::PickAddImage => {
                return Task::perform(pick_image("Select a face image"), Message::AddImagePicked);
            }
            Message::AddImagePicked(Some(path)) => {
                self.add_face.path = Some(path);
            }
            Message::AddImagePicked(None) => {}
            Message::AddFace => return self.add_face(),
            Message::AddFaceFinished(result) => {
                self.add_face.busy = false;
                match result {
                    Ok(notice) => {
                        let added = notice.severity == Severity::Success;
                        self.notify(notice);
                        if added {
                            self.add_face.reset();
                            return self.refresh_known_faces();
                        }
                    }
                    Err(e) => self.fail(&e),
                }
            }
            Message::RefreshKnownFaces => return self.refresh_known_faces(),
            Message::KnownFacesLoaded(result) => {
                self.known_faces_loading = false;
                match result {
                    Ok(list) => {
                        if !list.is_empty() {
                            self.notify(Notice::success(list.loaded_message()));
                        }
                        self.known_faces = list;
                    }
                    Err(e) => self.fail(&e),
                }
            }
            Message::KnownFace(KnownFaceAction::DeleteFace(name)) => {
                return self.delete_face(name);
            }
            Message::DeleteFinished(name, result) => match result {
                Ok(notice) => {
                    if notice.severity == Severity::Success {
                        self.known_faces.remove(&name);
                    }
                    self.notify(notice);
                }
                Err(e) => self.fail(&e),
            },
            Message::StartWebcam => self.start_webcam(),
            Message::StopWebcam => {
                if let Some(annotator) = self.webcam.annotator.as_mut() {
                    if annotator.is_running() {
                        annotator.stop();
                        self.notify(Notice::info("Webcam stopped"));
                    }
                }
                self.webcam.sync_canvas();
            }
            Message::WebcamTick => self.tick_webcam(),
            Message::ExpireToasts => {
                self.toasts.expire(Instant::now());
            }
            Message::DismissToast(id) => {
                self.toasts.dismiss(id);
            }
        }
        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        let server_bar = row![
            text("Server").size(13),
            text_input("http://localhost:5000", &self.server_url_input)
                .on_input(Message::ServerUrlChanged)
                .on_submit(Message::ApplyServerUrl)
                .padding(6)
                .width(Length::Fill),
            button(text("Connect").size(13))
                .on_press(Message::ApplyServerUrl)
                .style(button::secondary)
                .padding([6, 14]),
            text(self.server_status.as_str())
                .size(12)
                .color(theme::muted_color(&self.theme)),
        ]
        .spacing(10)
        .align_y(Alignment::Center);

        let tab_bar = row(Tab::ALL
            .iter()
            .map(|&tab| {
                let btn = button(text(tab.label()).size(13))
                    .on_press(Message::TabSelected(tab))
                    .padding([6, 14]);
                if tab == self.active_tab {
                    btn.style(button::primary).into()
                } else {
                    btn.style(button::text).into()
                }
            })
            .collect::<Vec<_>>())
        .spacing(2);

        let content: Element<'_, Message> = match self.active_tab {
            Tab::Recognize => recognize_tab::view(&self.recognize, &self.theme),
            Tab::AddFace => add_face_tab::view(&self.add_face, &self.theme),
            Tab::Webcam => webcam_tab::view(&self.webcam, &self.theme),
            Tab::KnownFaces => {
                known_faces_tab::view(&self.known_faces, self.known_faces_loading, &self.theme)
            }
        };

        let tab_content = container(scrollable(content).height(Length::Fill))
            .padding(16)
            .height(Length::Fill);

        column![
            container(server_bar).padding([8, 16]),
            container(tab_bar).padding([0, 12]),
            tab_content,
            self.toast_area(),
        ]
        .height(Length::Fill)
        .into()
    }

    pub fn theme(&self) -> Theme {
        self.theme.clone()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![event::listen_with(|event, _status, _window| match event {
            Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            _ => None,
        })];
        if self.webcam.is_running() {
            subscriptions
                .push(iced::time::every(self.config.frame_interval()).map(|_| Message::WebcamTick));
        }
        if !self.toasts.is_empty() {
            subscriptions.push(iced::time::every(TOAST_POLL_INTERVAL).map(|_| Message::ExpireToasts));
        }
        Subscription::batch(subscriptions)
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    fn notify(&mut self, notice: Notice) {
        self.toasts.push(notice, Instant::now());
    }

    fn fail(&mut self, error: &ClientError) {
        log::warn!("{error}");
        self.notify(Notice::from(error));
    }

    fn require_service(&mut self) -> Option<Arc<HttpFaceServiceClient>> {
        match &self.service {
            Ok(service) => Some(service.clone()),
            Err(e) => {
                let e = e.clone();
                self.fail(&e);
                None
            }
        }
    }

    fn check_health(&self) -> Task<Message> {
        match &self.service {
            Ok(service) => {
                let service = service.clone();
                Task::perform(run_blocking(move || service.health()), Message::HealthChecked)
            }
            Err(e) => Task::done(Message::HealthChecked(Err(e.clone()))),
        }
    }

    fn apply_server_url(&mut self) -> Task<Message> {
        let mut config = self.config.clone();
        config.apply_server_url(&self.server_url_input);
        if let Err(e) = config.validate() {
            self.notify(Notice::error(e.to_string()));
            return Task::none();
        }

        if self.webcam.is_running() {
            self.notify(Notice::info("Webcam stopped"));
        }
        self.webcam.release();
        self.config = config;
        self.server_url_input = self.config.server_url.clone();
        self.service = connect(&self.config);
        self.server_status = "Checking\u{2026}".to_string();

        match self.config.save() {
            Ok(path) => log::info!("Settings saved to {}", path.display()),
            Err(e) => self.notify(Notice::error(format!("Error: {e}"))),
        }
        Task::batch([self.check_health(), self.refresh_known_faces()])
    }

    fn accept_dropped_file(&mut self, path: PathBuf) {
        if !is_supported_image(&path) {
            self.notify(Notice::error(format!(
                "Unsupported file type; expected one of: {}",
                IMAGE_EXTENSIONS.join(", ")
            )));
            return;
        }
        match self.active_tab {
            Tab::AddFace => self.add_face.path = Some(path),
            _ => {
                self.active_tab = Tab::Recognize;
                self.recognize.path = Some(path);
                self.recognize.summary = None;
            }
        }
    }

    fn recognize_image(&mut self) -> Task<Message> {
        let Some(service) = self.require_service() else {
            return Task::none();
        };
        let use_case = RecognizeImageUseCase::new(service);
        let path = self.recognize.path.clone();
        if path.is_some() {
            self.recognize.busy = true;
            self.notify(Notice::info("Processing image..."));
        }
        Task::perform(
            run_blocking(move || use_case.execute(path.as_deref())),
            Message::RecognizeFinished,
        )
    }

    fn add_face(&mut self) -> Task<Message> {
        let Some(service) = self.require_service() else {
            return Task::none();
        };
        let use_case = KnownFacesUseCase::new(service);
        let name = self.add_face.name.clone();
        let path = self.add_face.path.clone();
        self.add_face.busy = true;
        Task::perform(
            run_blocking(move || use_case.add(&name, path.as_deref())),
            Message::AddFaceFinished,
        )
    }

    fn refresh_known_faces(&mut self) -> Task<Message> {
        let Some(service) = self.require_service() else {
            return Task::none();
        };
        let use_case = KnownFacesUseCase::new(service);
        self.known_faces_loading = true;
        Task::perform(
            run_blocking(move || use_case.refresh()),
            Message::KnownFacesLoaded,
        )
    }

    fn delete_face(&mut self, name: String) -> Task<Message> {
        let Some(service) = self.require_service() else {
            return Task::none();
        };
        let use_case = KnownFacesUseCase::new(service);
        Task::perform(
            run_blocking({
                let name = name.clone();
                move || use_case.delete(&name)
            }),
            move |result| Message::DeleteFinished(name.clone(), result),
        )
    }

    fn start_webcam(&mut self) {
        if self.webcam.annotator.is_none() {
            match self.build_annotator() {
                Ok(annotator) => self.webcam.annotator = Some(annotator),
                Err(e) => return self.fail(&e),
            }
        }
        let Some(annotator) = self.webcam.annotator.as_mut() else {
            return;
        };
        match annotator.start() {
            Ok(StartOutcome::Started) => {
                self.webcam.last_failure = None;
                self.notify(Notice::success("Webcam started"));
            }
            Ok(StartOutcome::AlreadyRunning) => {}
            Err(e) => self.fail(&e),
        }
        self.webcam.sync_canvas();
    }

    fn build_annotator(&mut self) -> Result<LiveFrameAnnotator, ClientError> {
        let service = self.service.clone()?;
        LiveFrameAnnotator::new(
            AnnotatorConfig::from_client_config(&self.config),
            Box::new(ThreadedCameraProvider::new(Box::new(
                FfmpegCameraProvider::new(),
            ))),
            service,
            Box::new(ThreadRequestDispatcher::new()),
            &self.webcam.canvas,
        )
        .map(|annotator| annotator.with_style(theme::overlay_style(&self.theme)))
    }

    fn tick_webcam(&mut self) {
        let Some(annotator) = self.webcam.annotator.as_mut() else {
            return;
        };
        match annotator.tick() {
            TickOutcome::Rendered {
                failed: Some(e), ..
            } => {
                let message = e.to_string();
                if self.webcam.last_failure.as_deref() != Some(message.as_str()) {
                    self.fail(&e);
                    self.webcam.last_failure = Some(message);
                }
            }
            TickOutcome::Ended(e) => self.fail(&e),
            TickOutcome::Rendered { .. } | TickOutcome::Warming | TickOutcome::Idle => {}
        }
        self.webcam.sync_canvas();
    }

    fn toast_area(&self) -> Element<'_, Message> {
        let toasts: Vec<Element<'_, Message>> = self
            .toasts
            .iter()
            .map(|toast| {
                let color = theme::severity_color(toast.notice.severity, &self.theme);
                container(
                    row![
                        text(toast.notice.message.as_str())
                            .color(color)
                            .width(Length::Fill),
                        button(text("\u{2715}").size(12))
                            .on_press(Message::DismissToast(toast.id))
                            .style(button::text),
                    ]
                    .align_y(Alignment::Center),
                )
                .padding([6, 12])
                .width(Length::Fill)
                .style(container::rounded_box)
                .into()
            })
            .collect();
        container(column(toasts).spacing(4))
            .padding([4, 16])
            .width(Length::Fill)
            .into()
    }
}

fn connect(config: &ClientConfig) -> Result<Arc<HttpFaceServiceClient>, ClientError> {
    HttpFaceServiceClient::from_config(config).map(Arc::new)
}

async fn pick_image(title: &'static str) -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .set_title(title)
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
        .await
        .map(|h| h.path().to_path_buf())
}
