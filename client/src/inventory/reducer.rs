//! Inventory admin reducer.

use crate::environment::ClientEnvironment;
use crate::gateway::HttpTransport;
use crate::inventory::actions::InventoryAction;
use crate::inventory::state::InventoryState;
use staybook_core::effect::Effect;
use staybook_core::reducer::Reducer;
use staybook_core::{SmallVec, request_effect, smallvec};
use std::fmt;
use std::marker::PhantomData;

/// Reducer for hotel, room and rate administration.
pub struct InventoryReducer<T> {
    _transport: PhantomData<fn() -> T>,
}

impl<T> InventoryReducer<T> {
    /// Create the reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _transport: PhantomData,
        }
    }
}

impl<T> Default for InventoryReducer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for InventoryReducer<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for InventoryReducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InventoryReducer")
    }
}

impl<T: HttpTransport> Reducer for InventoryReducer<T> {
    type State = InventoryState;
    type Action = InventoryAction;
    type Environment = ClientEnvironment<T>;

    #[allow(clippy::too_many_lines)]
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let api = env.api.clone();

        match action {
            // ═══════════════════════════════════════════════════════════
            // Reads
            // ═══════════════════════════════════════════════════════════
            InventoryAction::LoadHotels { request_id } => {
                state.active_hotels_load = Some(request_id);
                smallvec![request_effect! {
                    call: api.list_hotels(),
                    on_success: |hotels| Some(InventoryAction::HotelsLoaded { request_id, hotels }),
                    on_error: |error| Some(InventoryAction::LoadFailed { request_id, error })
                }]
            },

            InventoryAction::LoadRooms { request_id, hotel_id } => {
                if state.selected_hotel != Some(hotel_id) {
                    state.rooms.clear();
                }
                state.selected_hotel = Some(hotel_id);
                state.active_rooms_load = Some(request_id);
                smallvec![request_effect! {
                    call: api.list_rooms(hotel_id),
                    on_success: |rooms| Some(InventoryAction::RoomsLoaded { request_id, rooms }),
                    on_error: |error| Some(InventoryAction::LoadFailed { request_id, error })
                }]
            },

            InventoryAction::HotelsLoaded { request_id, hotels } => {
                if state.active_hotels_load == Some(request_id) {
                    tracing::debug!(count = hotels.len(), "Hotels loaded");
                    state.active_hotels_load = None;
                    state.hotels = hotels;
                    state.hotels_stale = false;
                    state.last_error = None;
                }
                SmallVec::new()
            },

            InventoryAction::RoomsLoaded { request_id, rooms } => {
                if state.active_rooms_load == Some(request_id) {
                    tracing::debug!(count = rooms.len(), "Rooms loaded");
                    state.active_rooms_load = None;
                    state.rooms = rooms;
                    state.rooms_stale = false;
                    state.last_error = None;
                }
                SmallVec::new()
            },

            InventoryAction::LoadFailed { request_id, error } => {
                if state.active_hotels_load == Some(request_id) {
                    tracing::warn!(%error, "Hotel list failed to load");
                    state.active_hotels_load = None;
                    state.hotels.clear();
                    state.last_error = Some(error);
                } else if state.active_rooms_load == Some(request_id) {
                    tracing::warn!(%error, "Room list failed to load");
                    state.active_rooms_load = None;
                    state.rooms.clear();
                    state.last_error = Some(error);
                }
                SmallVec::new()
            },

            // ═══════════════════════════════════════════════════════════
            // Mutations
            // ═══════════════════════════════════════════════════════════
            InventoryAction::CreateHotel { request_id, hotel } => {
                smallvec![request_effect! {
                    call: api.create_hotel(&hotel),
                    on_success: |hotel| Some(InventoryAction::HotelCreated { request_id, hotel }),
                    on_error: |error| Some(InventoryAction::MutationFailed { request_id, error })
                }]
            },

            InventoryAction::DeleteHotel { request_id, hotel_id } => {
                smallvec![request_effect! {
                    call: api.delete_hotel(hotel_id),
                    on_success: |_message| Some(InventoryAction::HotelDeleted { request_id, hotel_id }),
                    on_error: |error| Some(InventoryAction::MutationFailed { request_id, error })
                }]
            },

            InventoryAction::CreateRoom { request_id, room } => {
                smallvec![request_effect! {
                    call: api.create_room(&room),
                    on_success: |room| Some(InventoryAction::RoomCreated { request_id, room }),
                    on_error: |error| Some(InventoryAction::MutationFailed { request_id, error })
                }]
            },

            InventoryAction::CreateRate { request_id, rate } => {
                smallvec![request_effect! {
                    call: api.create_rate(&rate),
                    on_success: |rate| Some(InventoryAction::RateCreated { request_id, rate }),
                    on_error: |error| Some(InventoryAction::MutationFailed { request_id, error })
                }]
            },

            InventoryAction::HotelCreated { hotel, .. } => {
                tracing::info!(hotel_id = %hotel.id, name = %hotel.name, "Hotel created");
                state.hotels.push(hotel);
                state.hotels_stale = true;
                state.last_error = None;
                SmallVec::new()
            },

            InventoryAction::HotelDeleted { hotel_id, .. } => {
                tracing::info!(%hotel_id, "Hotel deleted");
                state.hotels.retain(|hotel| hotel.id != hotel_id);
                state.rates.retain(|rate| rate.hotel_id != hotel_id);
                if state.selected_hotel == Some(hotel_id) {
                    state.selected_hotel = None;
                    state.rooms.clear();
                }
                state.hotels_stale = true;
                state.last_error = None;
                SmallVec::new()
            },

            InventoryAction::RoomCreated { room, .. } => {
                tracing::info!(room_id = %room.id, hotel_id = %room.hotel_id, "Room created");
                if state.selected_hotel == Some(room.hotel_id) {
                    state.rooms.push(room);
                }
                state.rooms_stale = true;
                state.last_error = None;
                SmallVec::new()
            },

            InventoryAction::RateCreated { rate, .. } => {
                tracing::info!(rate_id = %rate.id, hotel_id = %rate.hotel_id, "Rate created");
                state.rates.push(rate);
                state.last_error = None;
                SmallVec::new()
            },

            InventoryAction::MutationFailed { error, .. } => {
                tracing::warn!(%error, "Inventory change rejected");
                state.last_error = Some(error);
                SmallVec::new()
            },

            InventoryAction::Reset => {
                *state = InventoryState::default();
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ClientError;
    use crate::gateway::ApiClient;
    use crate::inventory::types::{Hotel, HotelStatus, Room, RoomStatus, RoomType};
    use crate::mocks::{MemoryStorage, MockTransport};
    use crate::session::SessionStore;
    use crate::types::{HotelId, Money, RoomId};
    use staybook_testing::{ReducerTest, assertions};
    use std::sync::Arc;
    use uuid::Uuid;

    type TestReducer = InventoryReducer<MockTransport>;

    fn env() -> ClientEnvironment<MockTransport> {
        let session = SessionStore::restore(Arc::new(MemoryStorage::new()));
        ClientEnvironment::new(ApiClient::new(
            Arc::new(MockTransport::new()),
            session,
            Arc::new(ClientConfig::default()),
        ))
    }

    fn hotel(id: u64) -> Hotel {
        Hotel {
            id: HotelId::new(id),
            name: format!("Hotel {id}"),
            city: "Lima".to_string(),
            address: "Av. Costanera 100".to_string(),
            status: HotelStatus::Available,
            images: Vec::new(),
        }
    }

    fn room(id: u64, hotel_id: u64) -> Room {
        Room {
            id: RoomId::new(id),
            hotel_id: HotelId::new(hotel_id),
            room_number: 100 + u32::try_from(id).unwrap_or_default(),
            room_type: RoomType::Single,
            price: Money::from_cents(9_000),
            status: RoomStatus::Available,
            images: Vec::new(),
        }
    }

    fn loaded(hotels: Vec<Hotel>) -> InventoryState {
        InventoryState {
            hotels,
            hotels_stale: false,
            ..InventoryState::default()
        }
    }

    #[test]
    fn created_hotel_is_appended_and_list_flagged() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(loaded(vec![hotel(1)]))
            .when_action(InventoryAction::HotelCreated {
                request_id: Uuid::new_v4(),
                hotel: hotel(2),
            })
            .then_state(|state| {
                assert_eq!(state.hotels.len(), 2);
                assert!(state.hotels_stale);
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn rejected_mutation_leaves_lists_untouched() {
        let error = ClientError::Api {
            status: 409,
            message: "Hotel has active rooms".to_string(),
        };
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(loaded(vec![hotel(1)]))
            .when_action(InventoryAction::MutationFailed {
                request_id: Uuid::new_v4(),
                error: error.clone(),
            })
            .then_state(move |state| {
                assert_eq!(state.hotels, vec![hotel(1)]);
                assert!(!state.hotels_stale);
                assert_eq!(state.last_error, Some(error));
            })
            .run();
    }

    #[test]
    fn deleting_selected_hotel_clears_its_rooms() {
        let mut state = loaded(vec![hotel(1), hotel(2)]);
        state.selected_hotel = Some(HotelId::new(1));
        state.rooms = vec![room(7, 1)];

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(InventoryAction::HotelDeleted {
                request_id: Uuid::new_v4(),
                hotel_id: HotelId::new(1),
            })
            .then_state(|state| {
                assert_eq!(state.hotels, vec![hotel(2)]);
                assert!(state.rooms.is_empty());
                assert_eq!(state.selected_hotel, None);
            })
            .run();
    }

    #[test]
    fn rooms_of_other_hotels_are_not_appended() {
        let mut state = loaded(vec![hotel(1), hotel(2)]);
        state.selected_hotel = Some(HotelId::new(1));

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_actions([
                InventoryAction::RoomCreated {
                    request_id: Uuid::new_v4(),
                    room: room(7, 2),
                },
                InventoryAction::RoomCreated {
                    request_id: Uuid::new_v4(),
                    room: room(8, 1),
                },
            ])
            .then_state(|state| {
                assert_eq!(state.rooms, vec![room(8, 1)]);
                assert!(state.rooms_stale);
            })
            .run();
    }

    #[test]
    fn failed_hotel_load_empties_the_list() {
        let request_id = Uuid::new_v4();
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(loaded(vec![hotel(1)]))
            .when_actions([
                InventoryAction::LoadHotels { request_id },
                InventoryAction::LoadFailed {
                    request_id,
                    error: ClientError::network("connection refused"),
                },
            ])
            .then_state(|state| {
                assert!(state.hotels.is_empty());
                assert!(state.last_error.is_some());
            })
            .run();
    }

    #[test]
    fn load_clears_stale_flag_and_ignores_superseded_answers() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(InventoryState::default())
            .when_actions([
                InventoryAction::LoadHotels { request_id: first },
                InventoryAction::LoadHotels { request_id: second },
                InventoryAction::HotelsLoaded {
                    request_id: first,
                    hotels: vec![hotel(9)],
                },
                InventoryAction::HotelsLoaded {
                    request_id: second,
                    hotels: vec![hotel(1)],
                },
            ])
            .then_state(|state| {
                assert_eq!(state.hotels, vec![hotel(1)]);
                assert!(!state.hotels_stale);
            })
            .run();
    }
}
