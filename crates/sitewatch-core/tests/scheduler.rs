//! End-to-end scheduler scenarios against mock HTTP endpoints.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use sitewatch_core::{
    ClientConfig, DeliveryError, Hub, Observer, Scheduler, Site, SiteStatus, State,
};

fn fast_site(id: u32, url: &str) -> Arc<Site> {
    let config = ClientConfig::default().with_request_timeout(Duration::from_millis(500));
    Arc::new(Site::new(id, url, Duration::from_millis(10), &config))
}

async fn wait_for_status(site: &Arc<Site>, expected: SiteStatus, deadline: Duration) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if site.status().await.status == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

#[derive(Default)]
struct Recording {
    received: Mutex<Vec<State>>,
}

impl Recording {
    fn states(&self) -> Vec<State> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Observer for Recording {
    async fn notify(&self, state: &State) -> Result<(), DeliveryError> {
        self.received.lock().unwrap().push(state.clone());
        Ok(())
    }
}

#[tokio::test]
async fn statuses_settle_per_endpoint_health() {
    let healthy = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&healthy)
        .await;

    let broken = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&broken)
        .await;

    let scheduler = Scheduler::new();
    let up_site = fast_site(1, &healthy.uri());
    let down_site = fast_site(2, &broken.uri());
    let error_site = fast_site(3, "http://192.0.2.1:9/");

    scheduler
        .register(Arc::clone(&up_site), Arc::new(Hub::new()))
        .unwrap();
    scheduler
        .register(Arc::clone(&down_site), Arc::new(Hub::new()))
        .unwrap();
    scheduler
        .register(Arc::clone(&error_site), Arc::new(Hub::new()))
        .unwrap();

    assert!(wait_for_status(&up_site, SiteStatus::Up, Duration::from_secs(2)).await);
    assert!(wait_for_status(&down_site, SiteStatus::Down, Duration::from_secs(2)).await);
    assert!(wait_for_status(&error_site, SiteStatus::Error, Duration::from_secs(2)).await);
    assert_eq!(scheduler.len(), 3);
}

#[tokio::test]
async fn transition_is_pushed_to_the_hub_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let observer = Arc::new(Recording::default());
    let hub = Arc::new(Hub::new());
    hub.attach(Arc::clone(&observer) as Arc<dyn Observer>).await;

    let scheduler = Scheduler::new();
    let site = fast_site(1, &server.uri());
    scheduler.register(Arc::clone(&site), hub).unwrap();

    assert!(wait_for_status(&site, SiteStatus::Up, Duration::from_secs(2)).await);

    // Let several more (non-transition) ticks pass; only the paused -> up
    // transition should have been broadcast.
    tokio::time::sleep(Duration::from_millis(60)).await;
    let states = observer.states();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].status, "up");
    assert_eq!(states[0].name, server.uri());
}

#[tokio::test]
async fn recovery_produces_a_second_notification() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let observer = Arc::new(Recording::default());
    let hub = Arc::new(Hub::new());
    hub.attach(Arc::clone(&observer) as Arc<dyn Observer>).await;

    let scheduler = Scheduler::new();
    let site = fast_site(1, &server.uri());
    scheduler.register(Arc::clone(&site), hub).unwrap();

    assert!(wait_for_status(&site, SiteStatus::Down, Duration::from_secs(2)).await);
    assert!(wait_for_status(&site, SiteStatus::Up, Duration::from_secs(2)).await);

    let states = observer.states();
    assert_eq!(states.len(), 2);
    assert_eq!(states[0].status, "down");
    assert_eq!(states[1].status, "up");
    assert!(states[1].updated_at > states[0].updated_at);
}

#[tokio::test]
async fn failing_channel_does_not_suppress_the_healthy_one() {
    struct Broken;

    #[async_trait]
    impl Observer for Broken {
        async fn notify(&self, _state: &State) -> Result<(), DeliveryError> {
            Err(DeliveryError::Network {
                channel: "broken".into(),
                reason: "invalid webhook".into(),
            })
        }
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let observer = Arc::new(Recording::default());
    let hub = Arc::new(Hub::new());
    hub.attach(Arc::new(Broken)).await;
    hub.attach(Arc::clone(&observer) as Arc<dyn Observer>).await;

    let scheduler = Scheduler::new();
    let site = fast_site(1, &server.uri());
    scheduler.register(Arc::clone(&site), hub).unwrap();

    assert!(wait_for_status(&site, SiteStatus::Up, Duration::from_secs(2)).await);
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(observer.states().len(), 1);
}

#[tokio::test]
async fn revocation_stops_checks_and_frees_the_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let scheduler = Scheduler::new();
    let site = fast_site(1, &server.uri());
    scheduler
        .register(Arc::clone(&site), Arc::new(Hub::new()))
        .unwrap();
    assert!(wait_for_status(&site, SiteStatus::Up, Duration::from_secs(2)).await);

    scheduler.revoke(1);
    let start = tokio::time::Instant::now();
    while scheduler.contains(1) && start.elapsed() < Duration::from_secs(2) {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(!scheduler.contains(1));

    // No more checks after the task exits.
    let received_before = server.received_requests().await.unwrap().len();
    tokio::time::sleep(Duration::from_millis(60)).await;
    let received_after = server.received_requests().await.unwrap().len();
    assert_eq!(received_before, received_after);

    // The ID is logically new again.
    scheduler
        .register(fast_site(1, &server.uri()), Arc::new(Hub::new()))
        .unwrap();
}
