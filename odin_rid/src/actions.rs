/*
 * Copyright © 2025, United States Government, as represented by the Administrator of 
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License"); 
 * you may not use this file except in compliance with the License. You may obtain a copy 
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! synchronous actions that are executed from within the tracker context.
//! 
//! Other than async actor actions these are executed in-line while the tracker mutates its state, i.e. they
//! see the data exactly at the point of mutation. Registration returns an [`ActionHandle`] that has to be
//! used to explicitly remove the action again.

use tracing::warn;
use crate::errors::Result;

/// the generic action trait for callbacks that get a reference to the data in question
pub trait DataRefAction<T>: Send {
    fn execute (&mut self, data: &T)->Result<()>;
}

/// blanket impl so that plain closures can be used as actions
impl<T,F> DataRefAction<T> for F where F: FnMut(&T)->Result<()> + Send {
    fn execute (&mut self, data: &T)->Result<()> {
        self(data)
    }
}

/// opaque registration token returned when subscribing an action
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub struct ActionHandle(u64);

/// container for dynamically registered DataRefActions
pub struct DataRefActionList<T> {
    is_infallible: bool,
    next_id: u64,
    entries: Vec<(ActionHandle,Box<dyn DataRefAction<T>>)>
}

impl<T> DataRefActionList<T> {
    pub fn new ()->Self { DataRefActionList { is_infallible: false, next_id: 0, entries: Vec::new() } }

    /// infallible lists execute all entries and only log failures
    pub fn new_infallible ()->Self { DataRefActionList { is_infallible: true, next_id: 0, entries: Vec::new() } }

    pub fn subscribe (&mut self, action: impl DataRefAction<T> + 'static)->ActionHandle {
        self.next_id += 1;
        let handle = ActionHandle(self.next_id);
        self.entries.push( (handle, Box::new(action)));
        handle
    }

    pub fn unsubscribe (&mut self, handle: ActionHandle)->bool {
        let len = self.entries.len();
        self.entries.retain( |(h,_)| *h != handle);
        self.entries.len() < len
    }

    pub fn len (&self)->usize { self.entries.len() }
    pub fn is_empty (&self)->bool { self.entries.is_empty() }

    pub fn execute (&mut self, data: &T)->Result<()> {
        if self.is_infallible {
            for (h,a) in self.entries.iter_mut() {
                if let Err(e) = a.execute(data) {
                    warn!("action {:?} failed: {}", h, e);
                }
            }
        } else {
            for (_,a) in self.entries.iter_mut() {
                a.execute(data)?;
            }
        }
        Ok(())
    }
}

impl<T> Default for DataRefActionList<T> {
    fn default ()->Self { Self::new() }
}
