use crate::domain::Coordinates;
use crate::geocoding::{Geocoder, GeocodingError, match_echoes, normalize_address};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory geocoder answering from a fixed table.
#[derive(Default)]
pub struct FakeGeocoder {
    known: HashMap<String, Coordinates>,
    failing: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        FakeGeocoder::default()
    }

    pub fn with(mut self, address: &str, latitude: f64, longitude: f64) -> Self {
        let coordinates = Coordinates::new(latitude, longitude).expect("valid test coordinates");
        self.known.insert(normalize_address(address), coordinates);
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().expect("batches lock").clone()
    }

    async fn call(&self) -> Result<(), GeocodingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(GeocodingError::Api {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn lookup(&self, address: &str) -> Option<Coordinates> {
        self.known.get(&normalize_address(address)).copied().filter(|c| !c.is_sentinel())
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn resolve(&self, address: &str) -> Result<Option<Coordinates>, GeocodingError> {
        self.call().await?;
        Ok(self.lookup(address))
    }

    async fn resolve_many(&self, addresses: &[String]) -> Result<HashMap<String, Option<Coordinates>>, GeocodingError> {
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }
        self.batches.lock().expect("batches lock").push(addresses.to_vec());
        self.call().await?;
        Ok(match_echoes(addresses, addresses.iter().map(|address| (address.clone(), self.lookup(address)))))
    }
}
